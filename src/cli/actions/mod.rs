pub mod login;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Login {
        url: String,
        username: String,
        password: SecretString,
    },
}
