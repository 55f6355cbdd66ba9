use anyhow::Result;
use d2s_client::{Auth, Workspace};

fn main() -> Result<()> {
    // Example program that walks the resource hierarchy.
    // Configure the instance and credentials via env vars or a `.d2src` file.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let auth = Auth::from_env()?;
    let session = auth.login_from_config()?;

    if let Some(user) = auth.current_user(&session)? {
        println!("signed in as {} {} <{}>", user.first_name, user.last_name, user.email);
    }

    let workspace = Workspace::new(auth.base_url(), session)?;
    for project in workspace.get_projects(Some(true))?.collection {
        println!("project {}", project.id);
        for flight in project.get_flights(Some(true))?.collection {
            println!(
                "  flight {} ({})",
                flight.id,
                flight.acquisition_date.as_deref().unwrap_or("no date")
            );
            for product in flight.get_data_products()?.collection {
                println!("    data product {}", product.id);
            }
        }
    }

    Ok(())
}
