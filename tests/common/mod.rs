//! Shared test harness for integration tests.
//!
//! Provides [`TestBackend`], a wiremock server standing in for the node
//! editor backend together with a [`DrawerClient`] pointed at it, plus
//! helpers for building media blobs with embedded metadata.

#![allow(dead_code)]

use imagedrawer::client::DrawerClient;
use imagedrawer::config::BackendConfig;
use wiremock::MockServer;

/// Mock backend plus a client talking to it.
pub struct TestBackend {
    pub server: MockServer,
    pub client: DrawerClient,
}

impl TestBackend {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let config = BackendConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        };
        let client = DrawerClient::new(&config);
        Self { server, client }
    }
}

/// 1x1 grayscale PNG carrying the given `tEXt` chunks.
pub fn png_with_text(chunks: &[(&str, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, 1, 1);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        for (key, value) in chunks {
            encoder
                .add_text_chunk(key.to_string(), value.to_string())
                .expect("failed to add text chunk");
        }
        let mut writer = encoder.write_header().expect("failed to write header");
        writer
            .write_image_data(&[0])
            .expect("failed to write image data");
    }
    out
}
