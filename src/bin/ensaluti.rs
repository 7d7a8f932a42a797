use anyhow::Result;
use ensaluti::cli::{actions, actions::Action, start};

#[tokio::main]
async fn main() -> Result<()> {
    let action = start()?;

    match action {
        Action::Login { .. } => actions::login::handle(action).await?,
    }

    Ok(())
}
