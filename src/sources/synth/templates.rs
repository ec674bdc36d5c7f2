use rand::Rng;

/// Number of distinct catalog error messages.
pub const ERROR_MESSAGE_KINDS: usize = 8;
/// Number of distinct catalog success messages.
pub const INFO_MESSAGE_KINDS: usize = 6;

/// Draws one catalog error message with its ids filled in.
pub fn error_message(rng: &mut impl Rng) -> String {
    error_message_for(rng.gen_range(0..ERROR_MESSAGE_KINDS), rng)
}

/// Draws one catalog success message with its ids filled in.
pub fn info_message(rng: &mut impl Rng) -> String {
    info_message_for(rng.gen_range(0..INFO_MESSAGE_KINDS), rng)
}

fn error_message_for(kind: usize, rng: &mut impl Rng) -> String {
    match kind {
        0 => format!(
            "Connection timeout to database after {}ms",
            rng.gen_range(5_000..=30_000)
        ),
        1 => format!("Failed to authenticate user {}", user_id(rng)),
        2 => "Payment processing failed: insufficient funds".to_string(),
        3 => format!(
            "Inventory check failed for product prod_{}",
            rng.gen_range(1..=500)
        ),
        4 => format!("Rate limit exceeded for IP {}", client_ip(rng)),
        5 => "Invalid request payload: missing required field 'email'".to_string(),
        6 => "Service unavailable: upstream connection refused".to_string(),
        _ => "Database query timeout: SELECT * FROM orders WHERE...".to_string(),
    }
}

fn info_message_for(kind: usize, rng: &mut impl Rng) -> String {
    match kind {
        0 => "Request processed successfully".to_string(),
        1 => format!("User {} logged in", user_id(rng)),
        2 => format!("Order ord_{} created", rng.gen_range(10_000..=99_999)),
        3 => "Health check passed".to_string(),
        4 => format!("Cache hit for key cache_key_{}", rng.gen_range(1..=100)),
        _ => "Metrics exported successfully".to_string(),
    }
}

fn user_id(rng: &mut impl Rng) -> String {
    format!("user_{}", rng.gen_range(1..=1_000))
}

fn client_ip(rng: &mut impl Rng) -> String {
    format!(
        "192.168.{}.{}",
        rng.gen_range(1..=255),
        rng.gen_range(1..=255)
    )
}

/// Message for a failure signature that is absent from the error catalog.
pub fn novel_error(service: &str, rng: &mut impl Rng) -> String {
    format!(
        "NOVEL_ERROR_{}: Unexpected failure in {service}",
        rng.gen_range(1_000..=9_999)
    )
}
