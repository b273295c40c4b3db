use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use safeclass::api::Aggregate;
use safeclass::auth::{FileStore, SessionStore};
use safeclass::config::{Cli, Command, Config};
use safeclass::models::{Id, Student};
use safeclass::upload::ImageSource;
use safeclass::{ApiClient, ClientError, ClientResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    tracing::debug!("Data directory: {}", config.data_dir.display());

    // Restore the session before anything needs the token
    let storage = Arc::new(FileStore::in_dir(&config.data_dir));
    let session = Arc::new(SessionStore::new(storage, config.session.storage_key.clone()));
    session.restore().await;

    let client = ApiClient::from_config(&config, session)?;

    if let Err(e) = run(&client, cli.command).await {
        tracing::debug!("Command failed: {:?}", e);
        eprintln!("{}", e.user_message());
        if e.is_unauthorized() || matches!(e, ClientError::NotSignedIn) {
            eprintln!("Run `safeclass login` to start a new session.");
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(client: &ApiClient, command: Command) -> ClientResult<()> {
    if command.needs_session() && !client.session().is_signed() {
        return Err(ClientError::NotSignedIn);
    }

    match command {
        Command::Login {
            email,
            password,
            role,
        } => {
            let response = client.login(&email, &password, role).await?;
            match response.user {
                Some(user) => println!("Signed in as {} ({})", user.full_name, user.role),
                None => println!("Signed in"),
            }
        }
        Command::Logout => {
            client.logout().await;
            println!("Signed out");
        }
        Command::Whoami => {
            let user = client.get_current_user_profile().await?;
            println!("{} ({})", user.full_name, user.role);
            if let Some(email) = user.email {
                println!("  email: {}", email);
            }
            if let Some(phone) = user.phone {
                println!("  phone: {}", phone);
            }
        }
        Command::Rooms => {
            for room in client.list_rooms().await? {
                println!("{:>5}  {}", room.id, room.name);
            }
        }
        Command::Students { room, guardian } => {
            let students = match (room, guardian) {
                (Some(room), _) => client.get_students_by_room(room).await?,
                (None, Some(guardian)) => client.get_students_by_guardian(guardian).await?,
                (None, None) => client.list_students().await?,
            };
            if students.is_empty() {
                println!("No students found");
            }
            for student in students {
                println!(
                    "{:>5}  {}  allergies: {}",
                    student.id,
                    student.full_name,
                    none_if_empty(&student.allergies)
                );
            }
        }
        Command::Conditions { student } => {
            let conditions = client.get_conditions_for_student(student).await?;
            if conditions.is_empty() {
                println!("No medical conditions recorded");
            }
            for link in conditions {
                let condition = link.condition();
                println!("{:>5}  {}", condition.id, condition.name);
                println!(
                    "       protocol: {}",
                    condition.description.as_deref().unwrap_or("none provided")
                );
            }
        }
        Command::Medications { guardian } => {
            let children = client.get_students_by_guardian(guardian).await?;
            let names = names_by_id(&children);
            let medications = client.get_medications_for_students(&children).await;
            warn_if_partial(&medications, "medications");

            if medications.items.is_empty() {
                println!("No medications found");
            }
            for medication in &medications.items {
                println!(
                    "{}: {} {} ({})",
                    names.get(&medication.student_id).copied().unwrap_or("?"),
                    medication.name,
                    medication.dosage,
                    medication.schedule.as_deref().unwrap_or("no schedule"),
                );
            }
        }
        Command::Crises { guardian } => {
            let children = client.get_students_by_guardian(guardian).await?;
            let names = names_by_id(&children);
            let crises = client.get_crisis_history_for_students(&children).await;
            warn_if_partial(&crises, "history");

            if crises.items.is_empty() {
                println!("No crises recorded");
            }
            for event in &crises.items {
                println!(
                    "[{}] {}: {}",
                    event.created_at,
                    names.get(&event.user_id).copied().unwrap_or("?"),
                    event.description
                );
            }
        }
        Command::Emergency { student, condition } => {
            let student = client.get_student(student).await?;
            let linked = client.get_conditions_for_student(student.id).await?;
            let condition = match linked.iter().find(|l| l.condition_id == condition) {
                Some(link) => link.condition(),
                None => client.get_condition(condition).await?,
            };
            let actor = client.get_current_user_profile().await?;

            let event = client
                .create_emergency_event(&student, &condition, &actor)
                .await?;
            println!("Emergency recorded (history #{})", event.id);
            if let Some(protocol) = condition.description {
                println!("Protocol: {}", protocol);
            }
        }
        Command::UploadPicture { file } => {
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let user = client
                .upload_my_profile_picture(ImageSource::File(file), &file_name)
                .await?;
            println!("Profile picture updated for {}", user.full_name);
        }
    }

    Ok(())
}

fn names_by_id(students: &[Student]) -> HashMap<Id, &str> {
    students
        .iter()
        .map(|s| (s.id, s.full_name.as_str()))
        .collect()
}

fn warn_if_partial<T>(aggregate: &Aggregate<T>, what: &str) {
    if aggregate.is_partial() {
        eprintln!(
            "Warning: could not load {} for {} student(s); the list below is incomplete.",
            what,
            aggregate.failures.len()
        );
    }
}

fn none_if_empty(text: &str) -> &str {
    if text.trim().is_empty() {
        "none"
    } else {
        text
    }
}
