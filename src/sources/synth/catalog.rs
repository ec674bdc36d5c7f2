use rand::Rng;

pub const SERVICES: [&str; 5] = [
    "api-gateway",
    "user-service",
    "order-service",
    "payment-service",
    "inventory-service",
];

pub const REQUEST_PATHS: [&str; 6] = [
    "/api/users",
    "/api/orders",
    "/api/products",
    "/api/payments",
    "/api/inventory",
    "/health",
];

pub const ENVIRONMENTS: [&str; 2] = ["prod", "staging"];

pub const SUCCESS_STATUS: u16 = 200;

pub const ERROR_STATUS_CODES: [u16; 8] = [500, 502, 503, 504, 400, 401, 403, 429];

/// Uniform pick from a fixed, non-empty catalog.
pub fn pick<R: Rng>(rng: &mut R, catalog: &[&'static str]) -> &'static str {
    catalog[rng.gen_range(0..catalog.len())]
}

pub fn pick_code<R: Rng>(rng: &mut R) -> u16 {
    ERROR_STATUS_CODES[rng.gen_range(0..ERROR_STATUS_CODES.len())]
}
