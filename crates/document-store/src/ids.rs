use rand::distributions::Alphanumeric;
use rand::Rng;

const ID_LENGTH: usize = 20;

/// Client-side document id: 20 alphanumeric characters, the same shape the
/// hosted store generates.
pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LENGTH)
        .map(char::from)
        .collect()
}
