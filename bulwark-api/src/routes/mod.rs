/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `test_endpoint`: Input validation demo endpoint under `/api/test`
/// - `fallback`: JSON responses for unknown paths and methods

pub mod fallback;
pub mod health;
pub mod test_endpoint;
