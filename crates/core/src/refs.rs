/// Branch or tag name from a full git ref, e.g. `refs/heads/feature/x` gives
/// `feature/x`.
///
/// The first two `/` segments are dropped and the rest is kept as is, so
/// multi-segment branch names survive. Absent, empty, or too-short refs give
/// `None`.
pub fn branch_name(reference: Option<&str>) -> Option<String> {
    let reference = reference?;
    let mut parts = reference.splitn(3, '/');
    parts.next()?;
    parts.next()?;
    match parts.next() {
        Some(rest) if !rest.is_empty() => Some(rest.to_string()),
        _ => None,
    }
}
