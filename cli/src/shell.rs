use std::{io::Write, path::PathBuf};

use anyhow::Result;
use peersync_peer::{
    ControlClient, Located, PeerError, SharedDirectory, download,
};
use peersync_protocol::{
    RESP_FILE_NOT_FOUND, RESP_FILE_PUBLISHED, RESP_FILE_UNPUB_FAILED,
    RESP_FILE_UNPUBLISHED, RESP_NO_ACTIVE_PEER_HAS_FILE, RESP_NO_ACTIVE_PEERS,
    RESP_NO_FILES_FOUND, RESP_NO_PUBLISHED_FILES, is_valid_filename,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

const WELCOME: &str = "Welcome to PeerSync!";
const AVAILABLE_COMMANDS: &str =
    "Available commands are: get, lap, lpf, pub, sch, unp, xit.";
const AUTH_FAILED: &str = "Authentication failed. Please try again.";
const GOODBYE: &str = "Goodbye.";

/// One line typed by the user.
#[derive(Debug, PartialEq, Eq)]
enum UserCommand<'a> {
    ListActivePeers,
    ListPublishedFiles,
    Publish(&'a str),
    Unpublish(&'a str),
    Search(&'a str),
    Get(&'a str),
    Exit,
}

impl<'a> UserCommand<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let command = match line.split_once(' ') {
            Some(("pub", name)) => UserCommand::Publish(name),
            Some(("unp", name)) => UserCommand::Unpublish(name),
            Some(("sch", needle)) => UserCommand::Search(needle),
            Some(("get", name)) => UserCommand::Get(name),
            Some(_) => return None,
            None => match line {
                "lap" => UserCommand::ListActivePeers,
                "lpf" => UserCommand::ListPublishedFiles,
                "xit" => UserCommand::Exit,
                _ => return None,
            },
        };
        Some(command)
    }
}

/// Interactive peer session: credential prompt, then the command loop.
pub struct Shell<R> {
    client: ControlClient,
    shared: SharedDirectory,
    download_dir: PathBuf,
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> Shell<R> {
    pub fn new(
        client: ControlClient,
        shared: SharedDirectory,
        download_dir: PathBuf,
        input: R,
    ) -> Self {
        Self {
            client,
            shared,
            download_dir,
            lines: input.lines(),
        }
    }

    pub fn client(&self) -> &ControlClient {
        &self.client
    }

    /// Prompts until the server accepts a username and password. Returns
    /// `false` if input ends first.
    pub async fn login(&mut self) -> Result<bool> {
        loop {
            let Some(username) = self.prompt("Enter username: ").await? else {
                return Ok(false);
            };
            let Some(password) = self.prompt("Enter password: ").await? else {
                return Ok(false);
            };
            match self.client.authenticate(&username, &password).await {
                Ok(()) => {
                    println!("{WELCOME}");
                    println!("{AVAILABLE_COMMANDS}");
                    return Ok(true);
                }
                Err(PeerError::AuthenticationFailed) => {
                    println!("{AUTH_FAILED}")
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Reads commands until `xit` or end of input, then logs out.
    pub async fn run(&mut self) -> Result<()> {
        while let Some(line) = self.prompt("> ").await? {
            let line = line.trim();
            let Some(command) = UserCommand::parse(line) else {
                log::debug!("Ignoring {line:?}");
                continue;
            };
            if command == UserCommand::Exit {
                break;
            }
            if let Err(err) = self.execute(command).await {
                eprintln!("Error: {err}");
            }
        }

        if let Err(err) = self.client.logout().await {
            log::warn!("Logout failed: {err}");
        }
        println!("{GOODBYE}");
        Ok(())
    }

    async fn execute(&self, command: UserCommand<'_>) -> Result<()> {
        match command {
            UserCommand::ListActivePeers => {
                let peers = self.client.list_active_peers().await?;
                print_listing(&peers, "active peer", "", RESP_NO_ACTIVE_PEERS);
            }
            UserCommand::ListPublishedFiles => {
                let files = self.client.list_published_files().await?;
                print_listing(
                    &files,
                    "file",
                    " published",
                    RESP_NO_PUBLISHED_FILES,
                );
            }
            UserCommand::Search(needle) => {
                let files = self.client.search(needle).await?;
                print_listing(&files, "file", " found", RESP_NO_FILES_FOUND);
            }
            UserCommand::Publish(name) => {
                if !self.shared.contains(name) {
                    println!(
                        "{name} is not in {}",
                        self.shared.root().display()
                    );
                    return Ok(());
                }
                self.client.publish(name).await?;
                println!("{RESP_FILE_PUBLISHED}");
            }
            UserCommand::Unpublish(name) => {
                if self.client.unpublish(name).await? {
                    println!("{RESP_FILE_UNPUBLISHED}");
                } else {
                    println!("{RESP_FILE_UNPUB_FAILED}");
                }
            }
            UserCommand::Get(name) => self.get(name).await?,
            UserCommand::Exit => {}
        }
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<()> {
        if !is_valid_filename(name) {
            println!("Invalid filename: {name}");
            return Ok(());
        }
        match self.client.locate(name).await? {
            Located::FileNotFound => println!("{RESP_FILE_NOT_FOUND}"),
            Located::NoActivePeer => println!("{RESP_NO_ACTIVE_PEER_HAS_FILE}"),
            Located::Peer(location) => {
                let dest = self.download_dir.join(name);
                match download(location.endpoint, name, &dest).await {
                    Ok(_) => println!(
                        "{name} downloaded successfully from {}",
                        location.username
                    ),
                    Err(err) => {
                        log::warn!("Download of {name} failed: {err}");
                        println!(
                            "Failed to download {name} from {}",
                            location.username
                        );
                    }
                }
            }
        }
        Ok(())
    }

    async fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        print!("{text}");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }
}

/// Prints `items` under a "N noun(s)<suffix>:" header, or `empty` when
/// there are none.
fn print_listing(items: &[String], noun: &str, suffix: &str, empty: &str) {
    if items.is_empty() {
        println!("{empty}");
        return;
    }
    println!("{}{suffix}:", count_of(items.len(), noun));
    for item in items {
        println!("{item}");
    }
}

fn count_of(count: usize, noun: &str) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{plural}")
}
