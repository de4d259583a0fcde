//! The fixed product line-up and strain list.

/// Base path for static images.
pub const IMAGE_ROOT: &str = "/static/images";

/// A product shown in the detail modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    pub slug: &'static str,
    pub title: &'static str,
    pub badge: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    /// File names under [`IMAGE_ROOT`].
    pub images: &'static [&'static str],
}

impl Product {
    /// Absolute image paths for the gallery.
    #[must_use]
    pub fn image_paths(&self) -> Vec<String> {
        self.images
            .iter()
            .map(|file| format!("{IMAGE_ROOT}/{file}"))
            .collect()
    }
}

pub const PRODUCTS: &[Product] = &[
    Product {
        slug: "live-rosin",
        title: "Live Rosin",
        badge: "Premium Extract",
        description: "Our signature Live Rosin is crafted from fresh-frozen cannabis flowers, \
                      preserving the full spectrum of cannabinoids and terpenes. Experience \
                      unmatched flavor and potency in every dab.",
        features: &[
            "Fresh-frozen whole plant extraction",
            "Solventless process - no chemicals",
            "Full-spectrum cannabinoid profile",
            "Rich terpene preservation",
            "Available in multiple strains",
            "Lab-tested for purity and potency",
        ],
        images: &["live_rosin.png", "dabs_packaging.png"],
    },
    Product {
        slug: "all-in-ones",
        title: "All-In-Ones",
        badge: "Convenient & Portable",
        description: "Premium live rosin in a convenient all-in-one vape. No setup, no mess - \
                      just pure, potent vapor on the go. Perfect for those who want quality \
                      without compromise.",
        features: &[
            "Pre-filled with live rosin concentrate",
            "Rechargeable battery included",
            "Draw-activated - no buttons",
            "Discreet and portable design",
            "1 gram capacity",
            "Multiple strain options available",
        ],
        images: &["aio.png"],
    },
    Product {
        slug: "baller-jars",
        title: "Live Rosin Baller Jars 14G",
        badge: "Bulk Premium",
        description: "For the serious concentrate connoisseur. Our 14-gram baller jars offer \
                      exceptional value without sacrificing quality. Stock up on your favorite \
                      strains and experience consistent, premium live rosin.",
        features: &[
            "Bulk 14-gram quantity",
            "Best value for regular consumers",
            "Same premium quality as smaller sizes",
            "Airtight preservation container",
            "Perfect for sharing or extended use",
            "Multiple strain selections",
        ],
        images: &["live_rosin2.png", "dabs_packaging.png"],
    },
];

/// Look up a product by its URL slug.
#[must_use]
pub fn product(slug: &str) -> Option<&'static Product> {
    PRODUCTS.iter().find(|p| p.slug == slug)
}

pub const STRAINS: &[&str] = &[
    "Hawaiian Sweet Roll",
    "Heat Peaches x Mystery Meat",
    "Honey Icing",
    "Horchata Papaya",
    "Lemon Horchata",
    "Lemon Papaya Banana",
    "Lemon Zprite",
    "Peach Smoothie",
    "Strawberry Peach Pie",
    "Zkittles",
];

/// Cards visible at once; also the clone count on each side of the carousel.
pub const CARDS_PER_VIEW: usize = 3;

/// `"Honey Icing"` -> `/static/images/strains/Honey_Icing.png`.
#[must_use]
pub fn strain_image(name: &str) -> String {
    format!("{IMAGE_ROOT}/strains/{}.png", name.replace(' ', "_"))
}
