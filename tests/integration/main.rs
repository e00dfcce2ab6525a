//! Integration tests with mock HTTP server

mod client_http;
mod mock_server;
