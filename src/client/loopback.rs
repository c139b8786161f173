//! In-process transport.
//!
//! Every broadcast is handed straight to the callbacks registered for the
//! same reception id, our own included, so a single client sees its own
//! traffic the way it would on the network. Joined channels are written to
//! an optional state file, one pretty print per line, so they can be
//! replayed on the next start.

use crate::client::transport::{
    BroadcastMode, ChannelIdentity, EphemeralId, ReceptionCallback, RoundRef, Transport,
    TransportError,
};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use rand::RngExt;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

const PRETTY_PREFIX: &str = "<Speakeasy-v1:";
const PRETTY_SUFFIX: &str = ">";
const FIELD_SEPARATOR: char = '\x1f';

/// Bytes an asymmetric broadcast loses to the admin signature.
pub const ASYMMETRIC_OVERHEAD: usize = 256;

/// Payload limit used when nothing else is configured.
pub const DEFAULT_MAX_PAYLOAD: usize = 800;

struct Joined {
    identity: ChannelIdentity,
    callbacks: Vec<ReceptionCallback>,
}

#[derive(Default)]
struct Inner {
    joined: HashMap<String, Joined>,
    /// Pretty prints of joined channels in join order.
    persisted: Vec<String>,
    round: u64,
}

pub struct LoopbackTransport {
    inner: Mutex<Inner>,
    state_file: Option<PathBuf>,
    max_payload: usize,
}

impl LoopbackTransport {
    pub fn new(max_payload: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            state_file: None,
            max_payload,
        }
    }

    /// Create a transport backed by `path`, loading any channels recorded
    /// there by a previous run. A missing file is treated as empty.
    pub fn with_state_file(max_payload: usize, path: PathBuf) -> Result<Self, TransportError> {
        let persisted = match fs::read_to_string(&path) {
            Ok(contents) => contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            inner: Mutex::new(Inner {
                persisted,
                ..Inner::default()
            }),
            state_file: Some(path),
            max_payload,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a callback panicked mid-delivery; the
        // map itself is still consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn save(&self, persisted: &[String]) -> Result<(), TransportError> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut contents = persisted.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        fs::write(path, contents)?;
        Ok(())
    }

    fn build_identity(
        &self,
        reception_id: String,
        name: &str,
        description: &str,
    ) -> ChannelIdentity {
        let max_symmetric = self.max_payload;
        let max_asymmetric = max_symmetric.saturating_sub(ASYMMETRIC_OVERHEAD);
        let pretty_print = pretty_print(&reception_id, name, description, max_symmetric, max_asymmetric);
        ChannelIdentity {
            reception_id,
            name: name.to_string(),
            description: description.to_string(),
            max_symmetric,
            max_asymmetric,
            pretty_print,
        }
    }
}

fn random_reception_id() -> String {
    let mut rng = rand::rng();
    (0..16)
        .map(|_| format!("{:02x}", rng.random_range(0..=u8::MAX)))
        .collect()
}

fn pretty_print(
    reception_id: &str,
    name: &str,
    description: &str,
    max_symmetric: usize,
    max_asymmetric: usize,
) -> String {
    let body = [
        name,
        description,
        reception_id,
        &max_symmetric.to_string(),
        &max_asymmetric.to_string(),
    ]
    .join(&FIELD_SEPARATOR.to_string());
    format!(
        "{PRETTY_PREFIX}{name}|{}{PRETTY_SUFFIX}",
        BASE64_STANDARD.encode(body)
    )
}

fn parse_pretty(text: &str) -> Result<ChannelIdentity, TransportError> {
    let invalid = |why: &str| TransportError::InvalidPrettyPrint(why.to_string());

    let text = text.trim();
    let inner = text
        .strip_prefix(PRETTY_PREFIX)
        .and_then(|t| t.strip_suffix(PRETTY_SUFFIX))
        .ok_or_else(|| invalid("missing channel header"))?;
    let (_, encoded) = inner
        .rsplit_once('|')
        .ok_or_else(|| invalid("missing channel body"))?;
    let body = BASE64_STANDARD
        .decode(encoded)
        .map_err(|e| invalid(&e.to_string()))?;
    let body = String::from_utf8(body).map_err(|_| invalid("channel body is not UTF-8"))?;

    let fields: Vec<&str> = body.split(FIELD_SEPARATOR).collect();
    let [name, description, reception_id, sym, asym] = fields[..] else {
        return Err(invalid("wrong number of channel fields"));
    };
    if name.is_empty() {
        return Err(invalid("channel name is empty"));
    }
    if reception_id.len() != 32 || !reception_id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("malformed reception id"));
    }
    let max_symmetric = sym.parse().map_err(|_| invalid("malformed size limit"))?;
    let max_asymmetric = asym.parse().map_err(|_| invalid("malformed size limit"))?;

    Ok(ChannelIdentity {
        reception_id: reception_id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        max_symmetric,
        max_asymmetric,
        pretty_print: text.to_string(),
    })
}

impl Transport for LoopbackTransport {
    fn generate_channel(
        &self,
        name: &str,
        description: &str,
    ) -> Result<ChannelIdentity, TransportError> {
        if name.trim().is_empty() {
            return Err(TransportError::InvalidChannel("name is required".into()));
        }
        if name.contains(FIELD_SEPARATOR) || description.contains(FIELD_SEPARATOR) {
            return Err(TransportError::InvalidChannel(
                "name and description may not contain control characters".into(),
            ));
        }
        Ok(self.build_identity(random_reception_id(), name, description))
    }

    fn parse_pretty_print(&self, text: &str) -> Result<ChannelIdentity, TransportError> {
        parse_pretty(text)
    }

    fn join_channel(
        &self,
        identity: &ChannelIdentity,
        callback: ReceptionCallback,
    ) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if inner.joined.contains_key(&identity.reception_id) {
            return Err(TransportError::AlreadyJoined(identity.name.clone()));
        }
        let known = inner
            .persisted
            .iter()
            .filter_map(|p| parse_pretty(p).ok())
            .any(|p| p.reception_id == identity.reception_id);
        // Nothing changes in memory until the state file agrees.
        if !known {
            let mut persisted = inner.persisted.clone();
            persisted.push(identity.pretty_print.clone());
            self.save(&persisted)?;
            inner.persisted = persisted;
        }
        inner.joined.insert(
            identity.reception_id.clone(),
            Joined {
                identity: identity.clone(),
                callbacks: vec![callback],
            },
        );
        tracing::debug!(channel = %identity.name, "loopback joined");
        Ok(())
    }

    fn leave_channel(&self, identity: &ChannelIdentity) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if !inner.joined.contains_key(&identity.reception_id) {
            return Err(TransportError::NotJoined(identity.name.clone()));
        }
        let persisted: Vec<String> = inner
            .persisted
            .iter()
            .filter(|p| {
                parse_pretty(p)
                    .map(|id| id.reception_id != identity.reception_id)
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        self.save(&persisted)?;
        inner.persisted = persisted;
        inner.joined.remove(&identity.reception_id);
        tracing::debug!(channel = %identity.name, "loopback left");
        Ok(())
    }

    fn broadcast(
        &self,
        reception_id: &str,
        payload: &[u8],
        mode: BroadcastMode,
    ) -> Result<(RoundRef, EphemeralId), TransportError> {
        let (callbacks, round) = {
            let mut inner = self.lock();
            let joined = inner
                .joined
                .get(reception_id)
                .ok_or_else(|| TransportError::NotJoined(reception_id.to_string()))?;
            let max = match &mode {
                BroadcastMode::Symmetric => joined.identity.max_symmetric,
                BroadcastMode::Asymmetric { admin_key } => {
                    if admin_key.is_empty() {
                        return Err(TransportError::AdminKeyRejected(
                            joined.identity.name.clone(),
                        ));
                    }
                    joined.identity.max_asymmetric
                }
            };
            if payload.len() > max {
                return Err(TransportError::PayloadTooLarge {
                    size: payload.len(),
                    max,
                });
            }
            let callbacks = joined.callbacks.clone();
            inner.round += 1;
            (callbacks, RoundRef(inner.round))
        };

        // Callbacks run outside the lock so they may call back into us.
        for callback in &callbacks {
            callback(payload);
        }
        let ephemeral = EphemeralId(rand::rng().random_range(i64::MIN..=i64::MAX));
        Ok((round, ephemeral))
    }

    fn joined_channels(&self) -> Result<Vec<ChannelIdentity>, TransportError> {
        let inner = self.lock();
        let mut out = Vec::with_capacity(inner.persisted.len());
        for line in &inner.persisted {
            match parse_pretty(line) {
                Ok(identity) => out.push(identity),
                Err(e) => tracing::warn!("skipping unreadable channel in state file: {}", e),
            }
        }
        Ok(out)
    }

    fn echoes_own_broadcasts(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (ReceptionCallback, Arc<Mutex<Vec<Vec<u8>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ReceptionCallback = Arc::new(move |data: &[u8]| {
            sink.lock().unwrap().push(data.to_vec());
        });
        (callback, seen)
    }

    #[test]
    fn test_generate_and_parse() {
        let transport = LoopbackTransport::new(DEFAULT_MAX_PAYLOAD);
        let identity = transport
            .generate_channel("rustaceans", "all things | crab")
            .unwrap();
        assert_eq!(identity.reception_id.len(), 32);
        assert!(identity.pretty_print.starts_with("<Speakeasy-v1:rustaceans|"));
        assert_eq!(identity.max_asymmetric, DEFAULT_MAX_PAYLOAD - ASYMMETRIC_OVERHEAD);

        let parsed = transport.parse_pretty_print(&identity.pretty_print).unwrap();
        assert_eq!(parsed, identity);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let transport = LoopbackTransport::new(DEFAULT_MAX_PAYLOAD);
        for text in ["", "hello", "<Speakeasy-v1:x|!!!>", "<Speakeasy-v1:x|aGk=>"] {
            assert!(matches!(
                transport.parse_pretty_print(text),
                Err(TransportError::InvalidPrettyPrint(_))
            ));
        }
    }

    #[test]
    fn test_generate_requires_name() {
        let transport = LoopbackTransport::new(DEFAULT_MAX_PAYLOAD);
        assert!(transport.generate_channel("  ", "desc").is_err());
    }

    #[test]
    fn test_broadcast_reaches_own_callback() {
        let transport = LoopbackTransport::new(DEFAULT_MAX_PAYLOAD);
        let identity = transport.generate_channel("general", "").unwrap();
        let (callback, seen) = recorder();
        transport.join_channel(&identity, callback).unwrap();

        let (r1, _) = transport
            .broadcast(&identity.reception_id, b"one", BroadcastMode::Symmetric)
            .unwrap();
        let (r2, _) = transport
            .broadcast(&identity.reception_id, b"two", BroadcastMode::Symmetric)
            .unwrap();
        assert!(r2 > r1);
        assert_eq!(*seen.lock().unwrap(), vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn test_broadcast_limits() {
        let transport = LoopbackTransport::new(300);
        let identity = transport.generate_channel("general", "").unwrap();
        let (callback, seen) = recorder();
        transport.join_channel(&identity, callback).unwrap();

        let big = vec![0u8; 301];
        assert!(matches!(
            transport.broadcast(&identity.reception_id, &big, BroadcastMode::Symmetric),
            Err(TransportError::PayloadTooLarge { size: 301, max: 300 })
        ));
        let admin = BroadcastMode::Asymmetric {
            admin_key: "secret".into(),
        };
        assert!(matches!(
            transport.broadcast(&identity.reception_id, &[0u8; 45], admin.clone()),
            Err(TransportError::PayloadTooLarge { max: 44, .. })
        ));
        assert!(transport
            .broadcast(&identity.reception_id, &[0u8; 44], admin)
            .is_ok());
        assert!(matches!(
            transport.broadcast(
                &identity.reception_id,
                b"x",
                BroadcastMode::Asymmetric {
                    admin_key: String::new()
                }
            ),
            Err(TransportError::AdminKeyRejected(_))
        ));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_broadcast_unjoined() {
        let transport = LoopbackTransport::new(DEFAULT_MAX_PAYLOAD);
        assert!(matches!(
            transport.broadcast("nope", b"x", BroadcastMode::Symmetric),
            Err(TransportError::NotJoined(_))
        ));
    }

    #[test]
    fn test_join_twice_and_leave() {
        let transport = LoopbackTransport::new(DEFAULT_MAX_PAYLOAD);
        let identity = transport.generate_channel("general", "").unwrap();
        let (callback, _) = recorder();
        transport.join_channel(&identity, callback.clone()).unwrap();
        assert!(matches!(
            transport.join_channel(&identity, callback),
            Err(TransportError::AlreadyJoined(_))
        ));
        transport.leave_channel(&identity).unwrap();
        assert!(matches!(
            transport.leave_channel(&identity),
            Err(TransportError::NotJoined(_))
        ));
    }

    #[test]
    fn test_state_file_persists_joins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("channels.txt");

        let first = LoopbackTransport::with_state_file(DEFAULT_MAX_PAYLOAD, path.clone()).unwrap();
        assert!(first.joined_channels().unwrap().is_empty());
        let a = first.generate_channel("a", "first").unwrap();
        let b = first.generate_channel("b", "second").unwrap();
        let (callback, _) = recorder();
        first.join_channel(&a, callback.clone()).unwrap();
        first.join_channel(&b, callback).unwrap();
        first.leave_channel(&a).unwrap();

        let second = LoopbackTransport::with_state_file(DEFAULT_MAX_PAYLOAD, path).unwrap();
        let replayed = second.joined_channels().unwrap();
        assert_eq!(replayed, vec![b.clone()]);

        // Rejoining a replayed channel does not duplicate its line.
        let (callback, _) = recorder();
        second.join_channel(&b, callback).unwrap();
        assert_eq!(second.joined_channels().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_save_leaves_join_retryable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.txt");
        let transport = LoopbackTransport::with_state_file(DEFAULT_MAX_PAYLOAD, path.clone()).unwrap();
        let identity = transport.generate_channel("a", "").unwrap();

        // A directory where the file should be makes every write fail.
        fs::create_dir(&path).unwrap();
        let (callback, _) = recorder();
        assert!(matches!(
            transport.join_channel(&identity, callback.clone()),
            Err(TransportError::Io(_))
        ));
        assert!(matches!(
            transport.broadcast(&identity.reception_id, b"x", BroadcastMode::Symmetric),
            Err(TransportError::NotJoined(_))
        ));

        fs::remove_dir(&path).unwrap();
        transport.join_channel(&identity, callback).unwrap();
        assert_eq!(transport.joined_channels().unwrap(), vec![identity]);
    }

    #[test]
    fn test_failed_save_leaves_leave_retryable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.txt");
        let transport = LoopbackTransport::with_state_file(DEFAULT_MAX_PAYLOAD, path.clone()).unwrap();
        let identity = transport.generate_channel("a", "").unwrap();
        let (callback, seen) = recorder();
        transport.join_channel(&identity, callback).unwrap();

        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        assert!(transport.leave_channel(&identity).is_err());
        // Still joined and still remembered.
        transport
            .broadcast(&identity.reception_id, b"x", BroadcastMode::Symmetric)
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(transport.joined_channels().unwrap().len(), 1);

        fs::remove_dir(&path).unwrap();
        transport.leave_channel(&identity).unwrap();
        assert!(transport.joined_channels().unwrap().is_empty());
    }
}
