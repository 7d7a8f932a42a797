pub mod login;

#[derive(Debug)]
pub enum Action {
    Login {
        api_url: String,
        username: Option<String>,
        next: Option<String>,
    },
}
