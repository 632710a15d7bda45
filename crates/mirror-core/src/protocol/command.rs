//! Request line encoding.
//!
//! Every request is one ASCII line: `<token><arg1>[?<arg2>]\r\n`. The token
//! is four characters, there is no space before the first argument, and the
//! payload of an upload travels outside this framing (see
//! [`Session::upload`](crate::session::Session::upload)).

use super::ProtocolError;

/// Argument delimiter within a request line.
pub const ARG_DELIMITER: char = '?';

/// Line terminator for requests and responses.
pub const LINE_TERMINATOR: &str = "\r\n";

/// One protocol command with its arguments.
///
/// Paths are relative to the watched root and `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// First authentication step.
    User(String),
    /// Second authentication step.
    Password(String),
    /// Declare an upload: path and payload size in bytes.
    UploadBegin { path: String, size: u64 },
    /// Marker line sent immediately before the raw upload payload.
    UploadData,
    /// Delete a file.
    DeleteFile(String),
    /// Create a directory.
    CreateDir(String),
    /// Delete a directory.
    DeleteDir(String),
    /// Rename a directory.
    RenameDir { from: String, to: String },
    /// End the session.
    Exit,
}

impl Command {
    /// The four-character wire token for this command.
    pub fn token(&self) -> &'static str {
        match self {
            Command::User(_) => "USER",
            Command::Password(_) => "PASS",
            Command::UploadBegin { .. } => "UPLO",
            Command::UploadData => "UPL2",
            Command::DeleteFile(_) => "DELE",
            Command::CreateDir(_) => "MKDI",
            Command::DeleteDir(_) => "RMDI",
            Command::RenameDir { .. } => "RNDI",
            Command::Exit => "EXIT",
        }
    }

    /// The arguments in wire order.
    fn args(&self) -> Vec<String> {
        match self {
            Command::User(name) => vec![name.clone()],
            Command::Password(password) => vec![password.clone()],
            Command::UploadBegin { path, size } => vec![path.clone(), size.to_string()],
            Command::DeleteFile(path) | Command::CreateDir(path) | Command::DeleteDir(path) => {
                vec![path.clone()]
            }
            Command::RenameDir { from, to } => vec![from.clone(), to.clone()],
            Command::UploadData | Command::Exit => Vec::new(),
        }
    }

    /// Encode to the exact wire bytes, terminator included.
    ///
    /// The wire defines no escaping, so arguments containing the `?`
    /// delimiter or a line terminator are rejected before anything is
    /// written to the connection.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let args = self.args();
        for arg in &args {
            if arg.contains(ARG_DELIMITER) || arg.contains('\r') || arg.contains('\n') {
                return Err(ProtocolError::InvalidArgument(arg.clone()));
            }
        }

        let mut line = String::from(self.token());
        line.push_str(&args.join("?"));
        line.push_str(LINE_TERMINATOR);
        Ok(line.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_str(command: &Command) -> String {
        String::from_utf8(command.encode().unwrap()).unwrap()
    }

    // ==================== Wire format ====================

    #[test]
    fn test_user_wire_format() {
        assert_eq!(encode_str(&Command::User("alice".into())), "USERalice\r\n");
    }

    #[test]
    fn test_password_wire_format() {
        assert_eq!(
            encode_str(&Command::Password("secret".into())),
            "PASSsecret\r\n"
        );
    }

    #[test]
    fn test_upload_begin_wire_format() {
        let cmd = Command::UploadBegin {
            path: "notes.txt".into(),
            size: 12,
        };
        assert_eq!(encode_str(&cmd), "UPLOnotes.txt?12\r\n");
    }

    #[test]
    fn test_upload_data_wire_format() {
        assert_eq!(encode_str(&Command::UploadData), "UPL2\r\n");
    }

    #[test]
    fn test_path_commands_wire_format() {
        assert_eq!(
            encode_str(&Command::DeleteFile("a/b.txt".into())),
            "DELEa/b.txt\r\n"
        );
        assert_eq!(
            encode_str(&Command::CreateDir("drafts".into())),
            "MKDIdrafts\r\n"
        );
        assert_eq!(
            encode_str(&Command::DeleteDir("drafts".into())),
            "RMDIdrafts\r\n"
        );
    }

    #[test]
    fn test_rename_dir_wire_format() {
        let cmd = Command::RenameDir {
            from: "old".into(),
            to: "new".into(),
        };
        assert_eq!(encode_str(&cmd), "RNDIold?new\r\n");
    }

    #[test]
    fn test_exit_wire_format() {
        assert_eq!(encode_str(&Command::Exit), "EXIT\r\n");
    }

    // ==================== Round trip ====================

    #[test]
    fn test_arguments_recoverable_by_splitting() {
        let cmd = Command::RenameDir {
            from: "dir one".into(),
            to: "dir two".into(),
        };
        let line = encode_str(&cmd);
        let body = line
            .strip_prefix(cmd.token())
            .unwrap()
            .strip_suffix(LINE_TERMINATOR)
            .unwrap();
        let parts: Vec<&str> = body.split(ARG_DELIMITER).collect();
        assert_eq!(parts, vec!["dir one", "dir two"]);
    }

    #[test]
    fn test_size_recoverable_by_splitting() {
        let cmd = Command::UploadBegin {
            path: "big.bin".into(),
            size: 1048576,
        };
        let line = encode_str(&cmd);
        let body = line
            .strip_prefix("UPLO")
            .unwrap()
            .strip_suffix(LINE_TERMINATOR)
            .unwrap();
        let parts: Vec<&str> = body.split(ARG_DELIMITER).collect();
        assert_eq!(parts, vec!["big.bin", "1048576"]);
    }

    // ==================== Reserved characters ====================

    #[test]
    fn test_delimiter_in_path_rejected() {
        let cmd = Command::DeleteFile("what?.txt".into());
        assert!(matches!(
            cmd.encode(),
            Err(ProtocolError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_line_terminator_in_path_rejected() {
        let cmd = Command::CreateDir("evil\r\ndir".into());
        assert!(matches!(
            cmd.encode(),
            Err(ProtocolError::InvalidArgument(_))
        ));
        let cmd = Command::CreateDir("evil\ndir".into());
        assert!(matches!(
            cmd.encode(),
            Err(ProtocolError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_delimiter_in_credentials_rejected() {
        let cmd = Command::Password("pa?ss".into());
        assert!(matches!(
            cmd.encode(),
            Err(ProtocolError::InvalidArgument(_))
        ));
    }
}
