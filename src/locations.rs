//! Location catalog and free-text resolution.
//!
//! The provider only understands coordinates, so [`LocationResolver`] is the
//! single bridge between user-supplied `(name, region)` input and a fetchable
//! [`Location`]. The registry is built once at startup and shared via `Arc`.

use std::sync::Arc;

use crate::models::Location;

// ---

/// Immutable, ordered catalog of known locations.
#[derive(Debug, Clone)]
pub struct LocationRegistry {
    // ---
    locations: Vec<Location>,
}

impl LocationRegistry {
    // ---
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    /// The 27 Brazilian state capitals, in catalog order.
    pub fn brazilian_capitals() -> Self {
        // ---
        let capitals = [
            ("Rio Branco", "AC", -9.9747, -67.8243),
            ("Maceió", "AL", -9.6658, -35.7353),
            ("Macapá", "AP", 0.0389, -51.0664),
            ("Manaus", "AM", -3.1190, -60.0217),
            ("Salvador", "BA", -12.9714, -38.5014),
            ("Fortaleza", "CE", -3.7319, -38.5267),
            ("Brasília", "DF", -15.8267, -47.9218),
            ("Vitória", "ES", -20.3155, -40.3128),
            ("Goiânia", "GO", -16.6869, -49.2648),
            ("São Luís", "MA", -2.5387, -44.2828),
            ("Cuiabá", "MT", -15.6014, -56.0979),
            ("Campo Grande", "MS", -20.4697, -54.6201),
            ("Belo Horizonte", "MG", -19.9191, -43.9386),
            ("Belém", "PA", -1.4558, -48.5044),
            ("João Pessoa", "PB", -7.1195, -34.8450),
            ("Curitiba", "PR", -25.4244, -49.2654),
            ("Recife", "PE", -8.0476, -34.8770),
            ("Teresina", "PI", -5.0892, -42.8019),
            ("Rio de Janeiro", "RJ", -22.9068, -43.1729),
            ("Natal", "RN", -5.7945, -35.2110),
            ("Porto Alegre", "RS", -30.0346, -51.2177),
            ("Porto Velho", "RO", -8.7612, -63.9023),
            ("Boa Vista", "RR", 2.8235, -60.6758),
            ("Florianópolis", "SC", -27.5954, -48.5480),
            ("São Paulo", "SP", -23.5505, -46.6333),
            ("Aracaju", "SE", -10.9472, -37.0731),
            ("Palmas", "TO", -10.1689, -48.3317),
        ];

        Self::new(
            capitals
                .iter()
                .map(|&(name, region, lat, lon)| Location::new(name, region, lat, lon))
                .collect(),
        )
    }

    /// Every location, in declared order.
    pub fn list_all(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

// ---

/// Maps free-text `(name, region)` input to a canonical [`Location`].
#[derive(Debug, Clone)]
pub struct LocationResolver {
    // ---
    registry: Arc<LocationRegistry>,
}

impl LocationResolver {
    // ---
    pub fn new(registry: Arc<LocationRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve input to a known location.
    ///
    /// Matching order:
    /// 1. exact case-insensitive `(name, region)`; an empty region matches any
    /// 2. name alone, adopting the catalog entry's region
    ///
    /// Returns `None` when no entry carries the name under any region.
    pub fn resolve(&self, name: &str, region: &str) -> Option<&Location> {
        // ---
        let name = name.trim();
        let region = region.trim().to_uppercase();

        let exact = self.registry.list_all().iter().find(|loc| {
            eq_ignore_case(&loc.name, name)
                && (region.is_empty() || eq_ignore_case(&loc.region, &region))
        });

        exact.or_else(|| self.find_by_name(name))
    }

    /// Region of the first catalog entry named `name`.
    pub fn region_for(&self, name: &str) -> Option<&str> {
        self.find_by_name(name.trim()).map(|loc| loc.region.as_str())
    }

    /// Canonical `(name, region)` for read-only queries.
    ///
    /// Unknown input is returned normalized (name trimmed, region trimmed and
    /// uppercased) so stored rows are still matched verbatim.
    pub fn canonicalize(&self, name: &str, region: &str) -> (String, String) {
        // ---
        match self.resolve(name, region) {
            Some(loc) => (loc.name.clone(), loc.region.clone()),
            None => (name.trim().to_string(), region.trim().to_uppercase()),
        }
    }

    /// Catalog spelling of `name`, or the trimmed input when unknown.
    pub fn canonical_name(&self, name: &str) -> String {
        // ---
        let name = name.trim();
        self.find_by_name(name)
            .map_or_else(|| name.to_string(), |loc| loc.name.clone())
    }

    fn find_by_name(&self, name: &str) -> Option<&Location> {
        self.registry
            .list_all()
            .iter()
            .find(|loc| eq_ignore_case(&loc.name, name))
    }
}

/// Unicode-aware case-insensitive comparison ("SÃO PAULO" == "São Paulo").
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
