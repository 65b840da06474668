//! Web app manifest, so the browser client can be installed.

use axum::{http::header, response::IntoResponse, Json};
use serde::Serialize;

#[derive(Serialize)]
struct Icon {
    src: &'static str,
    sizes: &'static str,
    #[serde(rename = "type")]
    mime: &'static str,
    purpose: &'static str,
}

#[derive(Serialize)]
struct Manifest {
    name: &'static str,
    short_name: &'static str,
    description: &'static str,
    start_url: &'static str,
    display: &'static str,
    background_color: &'static str,
    theme_color: &'static str,
    icons: Vec<Icon>,
}

fn icons() -> Vec<Icon> {
    let mut icons = Vec::new();
    for (src, sizes) in [
        ("/manifest-icon-192.maskable.png", "192x192"),
        ("/manifest-icon-512.maskable.png", "512x512"),
    ] {
        for purpose in ["maskable", "any"] {
            icons.push(Icon {
                src,
                sizes,
                mime: "image/png",
                purpose,
            });
        }
    }
    icons
}

pub async fn manifest() -> impl IntoResponse {
    let manifest = Manifest {
        name: "Workout Tracker",
        short_name: "WorkoutTracker",
        description: "A Progressive Web App for tracking workouts, exercises, and sets",
        start_url: "/",
        display: "standalone",
        background_color: "#ffffff",
        theme_color: "#000000",
        icons: icons(),
    };

    (
        [(header::CONTENT_TYPE, "application/manifest+json")],
        Json(manifest),
    )
}
