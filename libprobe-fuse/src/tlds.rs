/// Candidate domains for `name` under each TLD. Leading dots on TLDs are
/// ignored so both `com` and `.com` work.
pub fn expand_tlds<'a>(name: &'a str, tlds: &'a [String]) -> impl Iterator<Item = String> + 'a {
    tlds.iter()
        .map(|tld| tld.trim().trim_start_matches('.'))
        .filter(|tld| !tld.is_empty())
        .map(move |tld| format!("{}.{}", name, tld.to_lowercase()))
}
