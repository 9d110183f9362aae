//! URL slugs for category names.

/// Lowercases, folds Spanish accents and joins words with single hyphens.
///
/// `"Plomería y Gas"` becomes `"plomeria-y-gas"`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        let folded = match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        };

        if folded.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(folded);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::validation::validate_slug;

    #[test]
    fn test_slugify_folds_accents() {
        assert_eq!(slugify("Plomería y Gas"), "plomeria-y-gas");
        assert_eq!(slugify("Diseño Gráfico"), "diseno-grafico");
        assert_eq!(slugify("Pingüinos"), "pinguinos");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  Maestro   Mayor -- de Obras "), "maestro-mayor-de-obras");
        assert_eq!(slugify("Electricidad/Domótica"), "electricidad-domotica");
    }

    #[test]
    fn test_slugify_output_passes_validation() {
        for name in ["Abogacía", "Técnico en PC's", "Jardinería & Poda", "A"] {
            assert!(validate_slug(&slugify(name)).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify("¿?"), "");
    }
}
