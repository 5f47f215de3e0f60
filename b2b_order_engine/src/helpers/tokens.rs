use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Length of e-mail confirmation and password reset keys
pub const TOKEN_LENGTH: usize = 48;

/// Generates a random alphanumeric key suitable for e-mail confirmation and password reset messages.
pub fn random_token() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(TOKEN_LENGTH).map(char::from).collect()
}
