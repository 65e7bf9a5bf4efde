//! Ellipsoïdes de référence

/// Ellipsoïde défini par son demi-grand axe et son aplatissement
#[derive(Debug, Clone, Copy)]
pub struct Ellipsoid {
    /// Demi-grand axe (rayon équatorial) en mètres
    pub a: f64,
    /// Aplatissement
    pub f: f64,
}

impl Ellipsoid {
    /// WGS84 (UTM, Web Mercator)
    pub const WGS84: Ellipsoid = Ellipsoid {
        a: 6378137.0,
        f: 1.0 / 298.257223563,
    };

    /// GRS80 (ITRF2008, utilisé par l'INEGI)
    /// Note: différence avec WGS84 < 0.1mm
    pub const GRS80: Ellipsoid = Ellipsoid {
        a: 6378137.0,
        f: 1.0 / 298.257222101,
    };

    /// Première excentricité au carré
    pub fn e2(&self) -> f64 {
        2.0 * self.f - self.f * self.f
    }

    /// Première excentricité
    pub fn e(&self) -> f64 {
        self.e2().sqrt()
    }

    /// Troisième aplatissement `n = f / (2 - f)`
    pub fn n(&self) -> f64 {
        self.f / (2.0 - self.f)
    }

    /// Rayon rectifiant : longueur du quart de méridien divisée par π/2
    pub fn rectifying_radius(&self) -> f64 {
        let n = self.n();
        let n2 = n * n;
        self.a / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0 + n2 * n2 * n2 / 256.0)
    }
}
