use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use crate::{ProtocolError, Result};

/// The command word that opens every request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Auth,
    Heartbeat,
    Tcp,
    Lap,
    Lpf,
    Pub,
    Unp,
    Sch,
    Get,
    Xit,
}

impl Command {
    /// Canonical spelling on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Auth => "auth",
            Command::Heartbeat => "HBT",
            Command::Tcp => "TCP",
            Command::Lap => "lap",
            Command::Lpf => "lpf",
            Command::Pub => "pub",
            Command::Unp => "unp",
            Command::Sch => "sch",
            Command::Get => "get",
            Command::Xit => "xit",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(word: &str) -> Result<Self> {
        let command = match word.to_ascii_lowercase().as_str() {
            "auth" => Command::Auth,
            "hbt" => Command::Heartbeat,
            "tcp" => Command::Tcp,
            "lap" => Command::Lap,
            "lpf" => Command::Lpf,
            "pub" => Command::Pub,
            "unp" => Command::Unp,
            "sch" => Command::Sch,
            "get" => Command::Get,
            "xit" => Command::Xit,
            _ => return Err(ProtocolError::UnknownCommand(word.to_owned())),
        };
        Ok(command)
    }
}

/// A decoded control request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Auth { username: String, password: String },
    Heartbeat,
    /// Announces where the sender accepts data-channel connections.
    TransferEndpoint(SocketAddr),
    ListActivePeers,
    ListPublishedFiles,
    Publish(String),
    Unpublish(String),
    Search(String),
    Get(String),
    Exit,
}

impl Request {
    /// Parses one datagram.
    ///
    /// The command word is matched case-insensitively and separated from its
    /// argument by the first space. Everything after that space is taken
    /// verbatim, so filenames and substrings may contain spaces. A single
    /// trailing line break is ignored.
    pub fn parse(datagram: &[u8]) -> Result<Self> {
        let text =
            std::str::from_utf8(datagram).map_err(|_| ProtocolError::NotUtf8)?;
        let text = text
            .strip_suffix('\n')
            .map(|t| t.strip_suffix('\r').unwrap_or(t))
            .unwrap_or(text);

        let (word, argument) = match text.split_once(' ') {
            Some((word, rest)) => (word, Some(rest)),
            None => (text, None),
        };
        let command: Command = word.parse()?;

        let request = match (command, argument) {
            (Command::Auth, Some(rest)) => parse_credentials(rest)?,
            (Command::Heartbeat, None) => Request::Heartbeat,
            (Command::Tcp, Some(rest)) => {
                Request::TransferEndpoint(parse_endpoint(rest)?)
            }
            (Command::Lap, None) => Request::ListActivePeers,
            (Command::Lpf, None) => Request::ListPublishedFiles,
            (Command::Xit, None) => Request::Exit,
            (Command::Pub, Some(name)) if !name.is_empty() => {
                Request::Publish(name.to_owned())
            }
            (Command::Unp, Some(name)) if !name.is_empty() => {
                Request::Unpublish(name.to_owned())
            }
            (Command::Sch, Some(needle)) if !needle.is_empty() => {
                Request::Search(needle.to_owned())
            }
            (Command::Get, Some(name)) if !name.is_empty() => {
                Request::Get(name.to_owned())
            }
            (command, _) => return Err(ProtocolError::Arity(command)),
        };
        Ok(request)
    }

    pub fn command(&self) -> Command {
        match self {
            Request::Auth { .. } => Command::Auth,
            Request::Heartbeat => Command::Heartbeat,
            Request::TransferEndpoint(_) => Command::Tcp,
            Request::ListActivePeers => Command::Lap,
            Request::ListPublishedFiles => Command::Lpf,
            Request::Publish(_) => Command::Pub,
            Request::Unpublish(_) => Command::Unp,
            Request::Search(_) => Command::Sch,
            Request::Get(_) => Command::Get,
            Request::Exit => Command::Xit,
        }
    }
}

fn parse_credentials(rest: &str) -> Result<Request> {
    let mut fields = rest.split(' ');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(username), Some(password), None)
            if !username.is_empty() && !password.is_empty() =>
        {
            Ok(Request::Auth {
                username: username.to_owned(),
                password: password.to_owned(),
            })
        }
        _ => Err(ProtocolError::Arity(Command::Auth)),
    }
}

fn parse_endpoint(rest: &str) -> Result<SocketAddr> {
    let invalid = || ProtocolError::InvalidEndpoint(rest.to_owned());
    let (ip, port) = rest.split_once(' ').ok_or_else(invalid)?;
    let ip: IpAddr = ip.parse().map_err(|_| invalid())?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    Ok(SocketAddr::new(ip, port))
}

/// Renders the request exactly as it travels on the wire.
impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let command = self.command();
        match self {
            Request::Auth { username, password } => {
                write!(f, "{command} {username} {password}")
            }
            Request::TransferEndpoint(endpoint) => {
                write!(f, "{command} {} {}", endpoint.ip(), endpoint.port())
            }
            Request::Publish(arg)
            | Request::Unpublish(arg)
            | Request::Search(arg)
            | Request::Get(arg) => write!(f, "{command} {arg}"),
            Request::Heartbeat
            | Request::ListActivePeers
            | Request::ListPublishedFiles
            | Request::Exit => write!(f, "{command}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"auth alice password123".as_slice(), Request::Auth {
        username: "alice".into(),
        password: "password123".into(),
    })]
    #[case(b"AUTH bob secretpass\n".as_slice(), Request::Auth {
        username: "bob".into(),
        password: "secretpass".into(),
    })]
    #[case(b"HBT".as_slice(), Request::Heartbeat)]
    #[case(b"hbt\r\n".as_slice(), Request::Heartbeat)]
    #[case(
        b"TCP 127.0.0.1 50123".as_slice(),
        Request::TransferEndpoint("127.0.0.1:50123".parse().unwrap())
    )]
    #[case(b"LaP".as_slice(), Request::ListActivePeers)]
    #[case(b"lpf".as_slice(), Request::ListPublishedFiles)]
    #[case(b"xit".as_slice(), Request::Exit)]
    #[case(
        b"pub annual report.pdf".as_slice(),
        Request::Publish("annual report.pdf".into())
    )]
    #[case(b"unp x.txt".as_slice(), Request::Unpublish("x.txt".into()))]
    #[case(b"sch  lead".as_slice(), Request::Search(" lead".into()))]
    #[case(b"GET Notes.TXT".as_slice(), Request::Get("Notes.TXT".into()))]
    fn parses_well_formed_requests(
        #[case] datagram: &[u8],
        #[case] expected: Request,
    ) {
        assert_eq!(Request::parse(datagram).unwrap(), expected);
    }

    #[rstest]
    #[case(b"".as_slice())]
    #[case(b"hello".as_slice())]
    #[case(b"auth alice".as_slice())]
    #[case(b"auth alice pass extra".as_slice())]
    #[case(b"auth  alice pass".as_slice())]
    #[case(b"lap now".as_slice())]
    #[case(b"HBT ".as_slice())]
    #[case(b"pub".as_slice())]
    #[case(b"pub ".as_slice())]
    #[case(b"get".as_slice())]
    #[case(b"TCP localhost 80".as_slice())]
    #[case(b"TCP 127.0.0.1 70000".as_slice())]
    #[case(b"TCP 127.0.0.1".as_slice())]
    #[case(b"pub \xff\xfe".as_slice())]
    fn rejects_malformed_requests(#[case] datagram: &[u8]) {
        assert!(Request::parse(datagram).is_err());
    }

    #[test]
    fn unknown_word_is_reported_verbatim() {
        assert_eq!(
            Request::parse(b"fetch x").unwrap_err(),
            ProtocolError::UnknownCommand("fetch".into())
        );
    }

    #[test]
    fn rendered_requests_parse_back() {
        let requests = [
            Request::Auth {
                username: "charlie".into(),
                password: "mypass456".into(),
            },
            Request::TransferEndpoint("10.0.0.7:4000".parse().unwrap()),
            Request::Search("with space".into()),
            Request::Exit,
        ];
        for request in requests {
            let wire = request.to_string();
            assert_eq!(Request::parse(wire.as_bytes()).unwrap(), request);
        }
    }
}
