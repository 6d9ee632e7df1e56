// src/bin/seed.rs
// DOCUMENTATION: Register a user and print a bearer token for it
// Usage: cargo run --bin seed -- --name "Max" --email max@example.com

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use places_api::auth::{issue_token, JwtConfig};
use places_api::config::{init_db_pool, Config};
use places_api::db::{PlaceRepository, PlaceStore};
use places_api::models::{NewUser, User};
use std::env;

fn parse_args(args: &[String]) -> Result<NewUser> {
    let mut name = None;
    let mut email = None;
    let mut image = None;

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .with_context(|| format!("missing value for {}", flag))?;
        match flag.as_str() {
            "--name" => name = Some(value.clone()),
            "--email" => email = Some(value.clone()),
            "--image" => image = Some(value.clone()),
            other => bail!("unknown argument {}", other),
        }
    }

    Ok(NewUser {
        name: name.context("--name is required")?,
        email: email.context("--email is required")?,
        image,
    })
}

#[actix_rt::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let new_user = parse_args(&args)?;

    let config = Config::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    let pool = init_db_pool(&config)
        .await
        .context("could not connect to the database")?;
    let store = PlaceRepository::new(pool);

    let user = User::new(new_user);
    store
        .insert_user(&user)
        .await
        .context("could not create user")?;

    let token = issue_token(user.id, &user.email, &JwtConfig::new(config.jwt_key.clone()))
        .context("could not sign token")?;

    println!("user id: {}", user.id);
    println!("token:   {}", token);
    Ok(())
}
