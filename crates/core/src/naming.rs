//! Client deployment identifier derived from the company name.

/// Derive the deployment identifier passed to the provisioning script.
///
/// Lower-cases the company name, replaces every space with a hyphen and
/// strips apostrophes. Other punctuation (e.g. `&`) is kept as-is; the value
/// is always shell-quoted before it reaches a command line.
///
/// # Examples
///
/// ```
/// use erpbtp_core::naming::client_identifier;
///
/// assert_eq!(client_identifier("Dupont Construction"), "dupont-construction");
/// assert_eq!(client_identifier("L'Entreprise Martin"), "lentreprise-martin");
/// ```
pub fn client_identifier(company: &str) -> String {
    company.to_lowercase().replace(' ', "-").replace('\'', "")
}
