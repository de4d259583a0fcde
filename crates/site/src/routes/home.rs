//! Home page: product line-up, strain carousel and the two forms.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use dabs_core::carousel::{AUTO_PLAY_INTERVAL_MS, Carousel, CarouselError, SWIPE_THRESHOLD_PX};
use dabs_core::catalog::{CARDS_PER_VIEW, PRODUCTS, Product, STRAINS, strain_image};
use serde::Deserialize;
use tracing::instrument;

use super::Banner;
use crate::cookies::VisitorCookies;
use crate::filters;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    /// Carousel track position; anything unparseable means the start.
    pub slide: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrainCard {
    pub name: &'static str,
    pub image: String,
}

/// The visible part of the strain carousel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrainWindow {
    pub cards: Vec<StrainCard>,
    pub prev_slide: usize,
    pub next_slide: usize,
}

impl StrainWindow {
    /// Settle the carousel at track position `slide` and take the cards in
    /// view.
    ///
    /// # Errors
    ///
    /// Returns `CarouselError` if the strain list cannot fill a view.
    pub fn at(slide: Option<usize>) -> Result<Self, CarouselError> {
        let carousel = Carousel::new(STRAINS.len(), CARDS_PER_VIEW)?;
        let carousel = match slide {
            Some(index) => carousel.at(index),
            None => carousel,
        };

        let cards = (carousel.index()..carousel.index() + CARDS_PER_VIEW)
            .map(|i| carousel.slot(i).slide)
            .filter_map(|slide| STRAINS.get(slide))
            .map(|&name| StrainCard {
                name,
                image: strain_image(name),
            })
            .collect();

        Ok(Self {
            cards,
            prev_slide: carousel.prev_index(),
            next_slide: carousel.next_index(),
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub banner: Banner,
    pub products: &'static [Product],
    pub strains: Option<StrainWindow>,
    pub autoplay_ms: u64,
    pub swipe_px: f64,
}

#[instrument(skip_all)]
pub async fn home(
    State(_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HomeQuery>,
) -> impl IntoResponse {
    let cookies = VisitorCookies::from_headers(&headers);
    let slide = query.slide.and_then(|s| s.trim().parse().ok());

    let strains = StrainWindow::at(slide)
        .inspect_err(|e| tracing::warn!(error = %e, "Strain carousel unavailable"))
        .ok();

    HomeTemplate {
        banner: Banner::new(&cookies, "/"),
        products: PRODUCTS,
        strains,
        autoplay_ms: AUTO_PLAY_INTERVAL_MS,
        swipe_px: SWIPE_THRESHOLD_PX,
    }
}
