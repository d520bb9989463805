//! Localized country names for the address blocks.

use crate::domain::sale::Language;

// (code, it, en, de, fr)
const COUNTRIES: &[(&str, &str, &str, &str, &str)] = &[
  ("IT", "Italia", "Italy", "Italien", "Italie"),
  ("DE", "Germania", "Germany", "Deutschland", "Allemagne"),
  ("FR", "Francia", "France", "Frankreich", "France"),
  ("GB", "Regno Unito", "United Kingdom", "Vereinigtes Königreich", "Royaume-Uni"),
  ("US", "Stati Uniti", "United States", "Vereinigte Staaten", "États-Unis"),
  ("ES", "Spagna", "Spain", "Spanien", "Espagne"),
  ("PT", "Portogallo", "Portugal", "Portugal", "Portugal"),
  ("AT", "Austria", "Austria", "Österreich", "Autriche"),
  ("CH", "Svizzera", "Switzerland", "Schweiz", "Suisse"),
  ("NL", "Paesi Bassi", "Netherlands", "Niederlande", "Pays-Bas"),
  ("BE", "Belgio", "Belgium", "Belgien", "Belgique"),
  ("LU", "Lussemburgo", "Luxembourg", "Luxemburg", "Luxembourg"),
  ("IE", "Irlanda", "Ireland", "Irland", "Irlande"),
  ("GR", "Grecia", "Greece", "Griechenland", "Grèce"),
  ("PL", "Polonia", "Poland", "Polen", "Pologne"),
  ("SI", "Slovenia", "Slovenia", "Slowenien", "Slovénie"),
  ("HR", "Croazia", "Croatia", "Kroatien", "Croatie"),
  ("SM", "San Marino", "San Marino", "San Marino", "Saint-Marin"),
];

/// Returns the localized country name, or `None` for an unknown code.
/// Lookup misses are a display concern, never an error.
pub fn country_name(code: &str, lang: Language) -> Option<&'static str> {
  let code = code.trim().to_uppercase();
  COUNTRIES
    .iter()
    .find(|(c, ..)| *c == code)
    .map(|(_, it, en, de, fr)| match lang {
      Language::It => *it,
      Language::En => *en,
      Language::De => *de,
      Language::Fr => *fr,
    })
}
