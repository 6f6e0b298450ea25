// hangouts/crates/hangouts/src/main.rs

#[cfg(feature = "cli")]
mod cli {
    use std::sync::Arc;

    use anyhow::{bail, Context, Result};
    use clap::{Args, Parser, Subcommand};
    use hangouts::{
        inbound_queue, spawn_inbound_worker, Config, Contact, ContactListPresenter,
        ContactsDatabase, InboundHandler, InboundOutcome, InboundSms, LogTransport,
        MessageListPresenter, Messenger,
    };
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tracing::{info, warn};
    use validator::Validate;

    #[derive(Parser)]
    #[command(name = "hangouts", version, about = "Contacts and SMS threads")]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// List contacts by name
        Contacts {
            #[arg(long)]
            json: bool,
        },
        /// Add a contact
        Add(ContactFields),
        /// Change fields of an existing contact
        Edit {
            id: i64,
            #[command(flatten)]
            fields: ContactFields,
        },
        /// Delete a contact and its whole thread
        Delete { id: i64 },
        /// Show one contact
        Show { id: i64 },
        /// Print a contact's message thread
        Thread {
            id: i64,
            #[arg(long)]
            json: bool,
        },
        /// Send a text to a contact
        Send { id: i64, text: String },
        /// Record a text received from a phone number
        Receive { from: String, body: String },
        /// Record received texts read from stdin, one `sender<TAB>body` per line
        Listen,
        /// Database statistics
        Stats,
    }

    #[derive(Args)]
    struct ContactFields {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        firstname: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        photo: Option<String>,
    }

    impl ContactFields {
        fn apply(self, mut contact: Contact) -> Contact {
            if let Some(name) = self.name {
                contact.name = name;
            }
            if let Some(firstname) = self.firstname {
                contact.firstname = firstname;
            }
            if let Some(phone) = self.phone {
                contact.phone = phone;
            }
            if self.email.is_some() {
                contact.email = self.email;
            }
            if self.address.is_some() {
                contact.address = self.address;
            }
            if self.photo.is_some() {
                contact.photo = self.photo;
            }
            contact.trimmed()
        }
    }

    fn checked(contact: Contact) -> Result<Contact> {
        contact
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid contact: {}", e))?;
        Ok(contact)
    }

    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        let config = Config::from_env()?;
        config.print_config();

        let db = Arc::new(ContactsDatabase::from_config(&config)?);

        match cli.command {
            Command::Contacts { json } => {
                let mut presenter = ContactListPresenter::new();
                let update = presenter.submit(db.contacts.get_all_contacts()?);
                if json {
                    println!("{}", serde_json::to_string_pretty(&presenter.rows())?);
                } else if update.is_empty {
                    println!("No contacts yet");
                } else {
                    for row in presenter.rows() {
                        println!("{:>5}  {:<30} {}", row.contact_id, row.title, row.phone);
                    }
                }
            }
            Command::Add(fields) => {
                let contact = checked(fields.apply(Contact::new("", "")))?;
                let id = db.contacts.insert_contact(&contact)?;
                println!("Contact added ({})", id);
            }
            Command::Edit { id, fields } => {
                let current = db
                    .contacts
                    .get_contact_by_id(id)?
                    .with_context(|| format!("Contact {} not found", id))?;
                let contact = checked(fields.apply(current))?;
                if db.contacts.update_contact(&contact)? == 0 {
                    bail!("Contact {} could not be updated", id);
                }
                println!("Contact updated");
            }
            Command::Delete { id } => {
                if db.contacts.delete_contact(id)? == 0 {
                    bail!("Contact {} not found", id);
                }
                println!("Contact deleted");
            }
            Command::Show { id } => {
                let contact = db
                    .contacts
                    .get_contact_by_id(id)?
                    .with_context(|| format!("Contact {} not found", id))?;
                println!("{}", serde_json::to_string_pretty(&contact)?);
            }
            Command::Thread { id, json } => {
                let contact = db
                    .contacts
                    .get_contact_by_id(id)?
                    .with_context(|| format!("Contact {} not found", id))?;
                let mut presenter = MessageListPresenter::new();
                let update = presenter.submit(db.messages.get_messages_for_contact(id)?);
                if json {
                    println!("{}", serde_json::to_string_pretty(presenter.rows())?);
                } else if update.is_empty {
                    println!("No messages with {}", contact.display_name());
                } else {
                    println!("Thread with {} ({})", contact.display_name(), contact.phone);
                    for row in presenter.rows() {
                        let arrow = match row.direction {
                            hangouts::presenter::Direction::Sent => ">>",
                            hangouts::presenter::Direction::Received => "<<",
                        };
                        match &row.time_label {
                            Some(label) => println!("{} [{}] {}", arrow, label, row.body),
                            None => println!("{}         {}", arrow, row.body),
                        }
                    }
                }
            }
            Command::Send { id, text } => {
                let messenger = Messenger::new(Arc::clone(&db), LogTransport);
                let message = messenger.send(id, &text).await?;
                println!("Message sent ({})", message.id);
            }
            Command::Receive { from, body } => {
                let handler = InboundHandler::new(Arc::clone(&db));
                match handler.handle(&InboundSms::new(from, body))? {
                    InboundOutcome::Stored { contact_id, contact_created, .. } => {
                        if contact_created {
                            println!("New contact created ({})", contact_id);
                        }
                        println!("Message stored for contact {}", contact_id);
                    }
                    InboundOutcome::Dropped { reason } => println!("Message dropped: {}", reason),
                }
            }
            Command::Listen => {
                let handler = Arc::new(InboundHandler::new(Arc::clone(&db)));
                let (tx, rx) = inbound_queue(&config);
                let worker = spawn_inbound_worker(handler, rx);

                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Some(line) = lines.next_line().await? {
                    match InboundSms::from_line(&line) {
                        Some(event) => tx.send(event).await?,
                        None => warn!("Skipping malformed line: {:?}", line),
                    }
                }
                drop(tx);

                let stored = worker.await?;
                println!("{} messages stored", stored);
            }
            Command::Stats => {
                let stats = db.get_stats()?;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
        }

        info!("Done");
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hangouts::telemetry::init_tracing("warn");
    cli::run().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    println!("CLI feature not enabled. Enable with --features cli");
}
