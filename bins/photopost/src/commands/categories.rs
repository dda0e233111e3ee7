//! Site categories and a credential check

use crate::context::AppContext;
use crate::CredentialArgs;
use anyhow::Result;
use photopost_cli::Status;
use photopost_core::Error;

pub async fn run(ctx: &AppContext, credentials: &CredentialArgs) -> Result<()> {
    let api = ctx.wordpress(credentials)?;
    let user = api.current_user().await.map_err(Error::from)?;
    let categories = api.categories().await.map_err(Error::from)?;

    if ctx.global.json {
        let report = serde_json::json!({
            "site": api.site_url(),
            "user": { "id": user.id, "name": user.name, "roles": user.roles },
            "categories": categories
                .iter()
                .map(|c| serde_json::json!({ "id": c.id, "name": c.name, "count": c.count }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    Status::success(&format!("Signed in to {} as {}", api.site_url(), user.name));
    Status::header("Categories");
    for category in &categories {
        println!("  {:>6}  {} ({})", category.id, category.name, category.count);
    }
    Ok(())
}
