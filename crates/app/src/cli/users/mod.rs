use clap::{Args, Subcommand};
use storefront_app::domain::users::{PgUsersService, UsersService};

use crate::cli::DatabaseArgs;

#[derive(Debug, Args)]
pub(crate) struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Debug, Subcommand)]
enum UsersSubcommand {
    /// Grant admin access to a user
    Promote(SubjectArgs),

    /// Revoke admin access from a user
    Demote(SubjectArgs),
}

#[derive(Debug, Args)]
struct SubjectArgs {
    /// Identity-provider subject id of the user
    #[arg(long)]
    subject: String,

    #[command(flatten)]
    database: DatabaseArgs,
}

pub(crate) async fn run(command: UsersCommand) -> Result<(), String> {
    match command.command {
        UsersSubcommand::Promote(args) => set_admin(args, true).await,
        UsersSubcommand::Demote(args) => set_admin(args, false).await,
    }
}

async fn set_admin(args: SubjectArgs, is_admin: bool) -> Result<(), String> {
    let service = PgUsersService::new(args.database.connect().await?);

    let user = service
        .set_admin(&args.subject, is_admin)
        .await
        .map_err(|error| format!("failed to update user '{}': {error}", args.subject))?;

    println!("subject: {}", user.subject);
    println!("is_admin: {}", user.is_admin);

    Ok(())
}
