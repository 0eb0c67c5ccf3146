//! Command Handler Module
//!
//! Maps each verb to its handler, validates arguments, and runs the command
//! against the store.
//!
//! ## Supported Commands
//!
//! ### String Commands
//! - `SET key value` - Set a key (an existing deadline is kept)
//! - `SETNX key value` - Set only if the key holds no string
//! - `GET key` - Get a key's value
//! - `MSET key value [key value ...]` - Set multiple keys
//! - `MGET key [key ...]` - Get multiple keys, `(nil)` for missing ones
//! - `INCR key` / `DECR key` - Adjust an integer by one
//!
//! ### List Commands
//! - `LPUSH key value [value ...]` - Prepend values
//! - `RPUSH key value [value ...]` - Append values
//! - `LPOP key` / `RPOP key` - Remove and return an end element
//! - `LRANGE key start stop` - Slice a list
//!
//! ### Hash Commands
//! - `HSET key field value [field value ...]`
//! - `HGET key field`
//! - `HDEL key field [field ...]`
//! - `HGETALL key`
//!
//! ### Key Commands
//! - `DEL key [key ...]` - Delete keys from any namespace
//! - `EXPIRE key seconds` - Set a deadline
//! - `TTL key` - Remaining seconds to live
//!
//! ### Server Commands
//! - `PING` - Liveness check
//! - `SAVE` - Write a snapshot now
//!
//! `MULTI`, `EXEC` and `DISCARD` are handled per session by
//! [`Session`](crate::commands::Session) before a command gets here.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     CommandHandler                        │
//! │                                                           │
//! │   execute() ─────┐                  ┌──── execute_batch() │
//! │   &StorageEngine │                  │ &mut Keyspace       │
//! │   (locks per op) ▼                  ▼ (one write guard)   │
//! │              ┌───────────────────────────┐                │
//! │              │ apply<D: KeyspaceOps>()   │                │
//! │              │   verb table → cmd_*()    │                │
//! │              └───────────────────────────┘                │
//! └───────────────────────────────────────────────────────────┘
//! ```

use crate::commands::reply::{CommandError, Reply};
use crate::protocol::Command;
use crate::storage::{KeyspaceOps, ListEnd, StorageEngine, StorageError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

type CommandResult = Result<Reply, CommandError>;

/// Executes commands against the shared storage engine.
#[derive(Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
    /// Where `SAVE` writes its snapshot
    snapshot_path: PathBuf,
}

impl CommandHandler {
    pub fn new(storage: Arc<StorageEngine>, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            snapshot_path: snapshot_path.into(),
        }
    }

    /// Executes one command, taking the store lock as the operation requires.
    pub fn execute(&self, command: &Command) -> Reply {
        let mut db: &StorageEngine = &self.storage;
        self.apply(command, &mut db)
    }

    /// Executes a queued batch while holding the exclusive lock throughout.
    ///
    /// Failed commands contribute their error text and do not stop the batch.
    /// Results that render as empty text are left out.
    pub fn execute_batch(&self, commands: &[Command]) -> Reply {
        debug!(commands = commands.len(), "Executing transaction batch");

        let mut keyspace = self.storage.lock_exclusive();
        let results = commands
            .iter()
            .map(|command| self.apply(command, &mut *keyspace).to_string())
            .filter(|rendered| !rendered.is_empty())
            .collect();

        Reply::Batch(results)
    }

    /// Dispatches a command to its handler.
    fn apply<D: KeyspaceOps>(&self, command: &Command, db: &mut D) -> Reply {
        let args = command.args();

        let result = match command.verb() {
            // String commands
            "SET" => cmd_set(db, args),
            "SETNX" => cmd_setnx(db, args),
            "GET" => cmd_get(db, args),
            "MSET" => cmd_mset(db, args),
            "MGET" => cmd_mget(db, args),
            "INCR" => cmd_incr(db, args, "INCR", 1),
            "DECR" => cmd_incr(db, args, "DECR", -1),

            // List commands
            "LPUSH" => cmd_push(db, args, "LPUSH", ListEnd::Head),
            "RPUSH" => cmd_push(db, args, "RPUSH", ListEnd::Tail),
            "LPOP" => cmd_pop(db, args, "LPOP", ListEnd::Head),
            "RPOP" => cmd_pop(db, args, "RPOP", ListEnd::Tail),
            "LRANGE" => cmd_lrange(db, args),

            // Hash commands
            "HSET" => cmd_hset(db, args),
            "HGET" => cmd_hget(db, args),
            "HDEL" => cmd_hdel(db, args),
            "HGETALL" => cmd_hgetall(db, args),

            // Key commands
            "DEL" => cmd_del(db, args),
            "EXPIRE" => cmd_expire(db, args),
            "TTL" => cmd_ttl(db, args),

            // Server commands
            "PING" => Ok(Reply::Pong),
            "SAVE" => self.cmd_save(db, args),

            // Transaction control only reaches here outside a session
            "MULTI" => Err(CommandError::NestedMulti),
            "EXEC" => Err(CommandError::ExecWithoutMulti),
            "DISCARD" => Err(CommandError::DiscardWithoutMulti),

            _ => Err(CommandError::UnknownCommand),
        };

        result.unwrap_or_else(Reply::Error)
    }

    /// SAVE
    ///
    /// Writes inline and replies only once the snapshot file is in place.
    /// The caller's connection waits for it; other connections keep running
    /// on the remaining runtime workers. `SnapshotScheduler` saves off the
    /// request path and moves the same work to the blocking pool instead.
    fn cmd_save<D: KeyspaceOps>(&self, db: &mut D, args: &[String]) -> CommandResult {
        require(args.is_empty(), "SAVE")?;

        save_to(db, &self.snapshot_path)?;
        Ok(Reply::Ok)
    }
}

fn save_to<D: KeyspaceOps>(db: &mut D, path: &Path) -> Result<(), CommandError> {
    match db.save_snapshot(path) {
        Ok(()) => {
            info!(path = %path.display(), "Snapshot saved");
            Ok(())
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Snapshot failed");
            Err(CommandError::Snapshot(e.to_string()))
        }
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

/// Fails with the arity error for `verb` unless `ok` holds.
#[inline]
fn require(ok: bool, verb: &str) -> Result<(), CommandError> {
    if ok {
        Ok(())
    } else {
        Err(CommandError::WrongArity(verb.to_string()))
    }
}

fn parse_integer(arg: &str) -> Result<i64, CommandError> {
    arg.parse().map_err(|_| CommandError::NotAnInteger)
}

fn pairs(args: &[String]) -> Vec<(String, String)> {
    args.chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

// ============================================================================
// String Commands
// ============================================================================

/// SET key value
fn cmd_set<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(args.len() == 2, "SET")?;
    db.set(&args[0], &args[1]);
    Ok(Reply::Ok)
}

/// SETNX key value
///
/// Replies OK whether or not the value was stored.
fn cmd_setnx<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(args.len() == 2, "SETNX")?;
    db.set_nx(&args[0], &args[1]);
    Ok(Reply::Ok)
}

/// GET key
fn cmd_get<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(args.len() == 1, "GET")?;
    db.get(&args[0])
        .map(Reply::Value)
        .ok_or_else(|| StorageError::NoSuchKey.into())
}

/// MSET key value [key value ...]
fn cmd_mset<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(!args.is_empty() && args.len() % 2 == 0, "MSET")?;
    db.mset(&pairs(args));
    Ok(Reply::Ok)
}

/// MGET key [key ...]
fn cmd_mget<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(!args.is_empty(), "MGET")?;
    let values: Vec<String> = db
        .mget(args)
        .into_iter()
        .map(|value| value.unwrap_or_else(|| Reply::Nil.to_string()))
        .collect();
    Ok(Reply::Value(values.join(" ")))
}

/// INCR key / DECR key
fn cmd_incr<D: KeyspaceOps>(db: &mut D, args: &[String], verb: &str, delta: i64) -> CommandResult {
    require(args.len() == 1, verb)?;
    let value = db.incr_by(&args[0], delta)?;
    Ok(Reply::Integer(value))
}

// ============================================================================
// List Commands
// ============================================================================

/// LPUSH key value [value ...] / RPUSH key value [value ...]
fn cmd_push<D: KeyspaceOps>(db: &mut D, args: &[String], verb: &str, end: ListEnd) -> CommandResult {
    require(args.len() >= 2, verb)?;
    let len = db.push(&args[0], &args[1..], end);
    Ok(Reply::Integer(len as i64))
}

/// LPOP key / RPOP key
fn cmd_pop<D: KeyspaceOps>(db: &mut D, args: &[String], verb: &str, end: ListEnd) -> CommandResult {
    require(args.len() == 1, verb)?;
    Ok(Reply::Value(db.pop(&args[0], end)?))
}

/// LRANGE key start stop
fn cmd_lrange<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(args.len() == 3, "LRANGE")?;
    let start = parse_integer(&args[1])?;
    let stop = parse_integer(&args[2])?;

    let values = db.lrange(&args[0], start, stop)?;
    if values.is_empty() {
        return Ok(Reply::Empty);
    }
    Ok(Reply::Value(values.join(" ")))
}

// ============================================================================
// Hash Commands
// ============================================================================

/// HSET key field value [field value ...]
fn cmd_hset<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(args.len() >= 3 && args.len() % 2 == 1, "HSET")?;
    let added = db.hset(&args[0], &pairs(&args[1..]));
    Ok(Reply::Integer(added as i64))
}

/// HGET key field
fn cmd_hget<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(args.len() == 2, "HGET")?;
    Ok(db.hget(&args[0], &args[1]).map_or(Reply::Nil, Reply::Value))
}

/// HDEL key field [field ...]
fn cmd_hdel<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(args.len() >= 2, "HDEL")?;
    let removed = db.hdel(&args[0], &args[1..]);
    Ok(Reply::Integer(removed as i64))
}

/// HGETALL key
fn cmd_hgetall<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(args.len() == 1, "HGETALL")?;
    let fields = db.hgetall(&args[0]);
    if fields.is_empty() {
        return Ok(Reply::Empty);
    }

    let flat: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, value)| [field, value])
        .collect();
    Ok(Reply::Value(flat.join(" ")))
}

// ============================================================================
// Key Commands
// ============================================================================

/// DEL key [key ...]
fn cmd_del<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(!args.is_empty(), "DEL")?;
    Ok(Reply::Integer(db.del(args) as i64))
}

/// EXPIRE key seconds
fn cmd_expire<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(args.len() == 2, "EXPIRE")?;
    let seconds = parse_integer(&args[1])?;
    let applied = db.expire(&args[0], seconds);
    Ok(Reply::Integer(applied as i64))
}

/// TTL key
fn cmd_ttl<D: KeyspaceOps>(db: &mut D, args: &[String]) -> CommandResult {
    require(args.len() == 1, "TTL")?;
    Ok(Reply::Integer(db.ttl(&args[0])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_handler() -> CommandHandler {
        let storage = Arc::new(StorageEngine::new());
        CommandHandler::new(storage, "unused.snap")
    }

    fn make_command(args: &[&str]) -> Command {
        Command::from_parts(args).unwrap()
    }

    fn run(handler: &CommandHandler, args: &[&str]) -> String {
        handler.execute(&make_command(args)).to_string()
    }

    #[test]
    fn test_ping() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["PING"]), "PONG");
        assert_eq!(run(&handler, &["ping", "ignored"]), "PONG");
    }

    #[test]
    fn test_set_get() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["SET", "a", "1"]), "OK");
        assert_eq!(run(&handler, &["GET", "a"]), "1");
    }

    #[test]
    fn test_get_nonexistent() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["GET", "nope"]), "(error) ERR no such key");
    }

    #[test]
    fn test_setnx_always_replies_ok() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["SETNX", "a", "1"]), "OK");
        assert_eq!(run(&handler, &["SETNX", "a", "2"]), "OK");
        assert_eq!(run(&handler, &["GET", "a"]), "1");
    }

    #[test]
    fn test_mset_mget() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["MSET", "k1", "v1", "k2", "v2"]), "OK");
        assert_eq!(run(&handler, &["MGET", "k1", "k3", "k2"]), "v1 (nil) v2");
        assert_eq!(
            run(&handler, &["MSET", "k1", "v1", "k2"]),
            "(error) ERR wrong number of arguments for 'MSET' command"
        );
    }

    #[test]
    fn test_incr_decr() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["INCR", "c"]), "(integer) 1");
        assert_eq!(run(&handler, &["INCR", "c"]), "(integer) 2");
        assert_eq!(run(&handler, &["DECR", "c"]), "(integer) 1");

        run(&handler, &["SET", "s", "abc"]);
        assert_eq!(run(&handler, &["INCR", "s"]), "(error) ERR value is not an integer");

        run(&handler, &["RPUSH", "l", "x"]);
        assert_eq!(
            run(&handler, &["DECR", "l"]),
            "(error) WRONGTYPE Operation against a key holding the wrong kind of value"
        );
    }

    #[test]
    fn test_list_commands() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["RPUSH", "l", "x", "y"]), "(integer) 2");
        assert_eq!(run(&handler, &["LPOP", "l"]), "x");
        assert_eq!(run(&handler, &["RPUSH", "l", "z"]), "(integer) 2");
        assert_eq!(run(&handler, &["RPOP", "l"]), "z");
        assert_eq!(run(&handler, &["RPOP", "l"]), "y");
        assert_eq!(run(&handler, &["RPOP", "l"]), "(error) ERR no such key");
    }

    #[test]
    fn test_lrange() {
        let handler = create_handler();
        run(&handler, &["RPUSH", "l", "a", "b", "c"]);

        assert_eq!(run(&handler, &["LRANGE", "l", "-2", "-1"]), "b c");
        assert_eq!(run(&handler, &["LRANGE", "l", "0", "100"]), "a b c");
        assert_eq!(run(&handler, &["LRANGE", "l", "2", "1"]), "empty");
        assert_eq!(
            run(&handler, &["LRANGE", "l", "x", "1"]),
            "(error) ERR value is not an integer"
        );
        assert_eq!(
            run(&handler, &["LRANGE", "l", "0"]),
            "(error) ERR wrong number of arguments for 'LRANGE' command"
        );
    }

    #[test]
    fn test_hash_commands() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["HSET", "h", "b", "2", "a", "1"]), "(integer) 2");
        assert_eq!(run(&handler, &["HGET", "h", "a"]), "1");
        assert_eq!(run(&handler, &["HGET", "h", "zz"]), "(nil)");
        assert_eq!(run(&handler, &["HGETALL", "h"]), "a 1 b 2");
        assert_eq!(run(&handler, &["HDEL", "h", "a", "b"]), "(integer) 2");
        assert_eq!(run(&handler, &["HGETALL", "h"]), "empty");
        assert_eq!(
            run(&handler, &["HSET", "h", "f"]),
            "(error) ERR wrong number of arguments for 'HSET' command"
        );
    }

    #[test]
    fn test_del_across_namespaces() {
        let handler = create_handler();
        run(&handler, &["SET", "s", "1"]);
        run(&handler, &["RPUSH", "l", "x"]);
        assert_eq!(run(&handler, &["DEL", "s", "l", "missing"]), "(integer) 2");
        assert_eq!(run(&handler, &["DEL", "s"]), "(integer) 0");
    }

    #[test]
    fn test_expire_ttl() {
        let handler = create_handler();
        run(&handler, &["SET", "a", "1"]);

        assert_eq!(run(&handler, &["TTL", "a"]), "(integer) -1");
        assert_eq!(run(&handler, &["EXPIRE", "a", "100"]), "(integer) 1");
        assert!(["(integer) 99", "(integer) 100"].contains(&run(&handler, &["TTL", "a"]).as_str()));
        assert_eq!(run(&handler, &["EXPIRE", "nope", "100"]), "(integer) 0");
        assert_eq!(
            run(&handler, &["EXPIRE", "a", "soon"]),
            "(error) ERR value is not an integer"
        );

        assert_eq!(run(&handler, &["EXPIRE", "a", "-1"]), "(integer) 1");
        assert_eq!(run(&handler, &["TTL", "a"]), "(integer) -2");
        assert_eq!(run(&handler, &["GET", "a"]), "(error) ERR no such key");
    }

    #[test]
    fn test_arity_errors() {
        let handler = create_handler();
        for (args, verb) in [
            (&["SET", "a"][..], "SET"),
            (&["GET"][..], "GET"),
            (&["LPUSH", "l"][..], "LPUSH"),
            (&["TTL", "a", "b"][..], "TTL"),
            (&["DEL"][..], "DEL"),
            (&["SAVE", "now"][..], "SAVE"),
        ] {
            assert_eq!(
                run(&handler, args),
                format!("(error) ERR wrong number of arguments for '{}' command", verb)
            );
        }
    }

    #[test]
    fn test_unknown_command() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["FLUSHALL"]), "(error) ERR unknown command");
    }

    #[test]
    fn test_transaction_verbs_without_session() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["EXEC"]), "(error) ERR EXEC without MULTI");
        assert_eq!(run(&handler, &["DISCARD"]), "(error) ERR DISCARD without MULTI");
    }

    #[test]
    fn test_execute_batch_continues_after_errors() {
        let handler = create_handler();
        let batch = vec![
            make_command(&["SET", "x", "1"]),
            make_command(&["INCR", "x"]),
            make_command(&["GET", "missing"]),
            make_command(&["GET", "x"]),
        ];

        assert_eq!(
            handler.execute_batch(&batch),
            Reply::Batch(vec![
                "OK".to_string(),
                "(integer) 2".to_string(),
                "(error) ERR no such key".to_string(),
                "2".to_string(),
            ])
        );
        assert_eq!(run(&handler, &["GET", "x"]), "2");
    }

    #[test]
    fn test_execute_batch_skips_empty_results() {
        let handler = create_handler();
        let batch = vec![make_command(&["SET", "blank", ""]), make_command(&["GET", "blank"])];
        assert_eq!(
            handler.execute_batch(&batch),
            Reply::Batch(vec!["OK".to_string()])
        );
        assert_eq!(handler.execute_batch(&[]), Reply::Batch(vec![]));
    }

    #[test]
    fn test_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.snap");
        let handler = CommandHandler::new(Arc::new(StorageEngine::new()), &path);

        run(&handler, &["SET", "a", "1"]);
        assert_eq!(run(&handler, &["SAVE"]), "OK");

        let restored = StorageEngine::open(&path).unwrap();
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn test_concurrent_saves_all_reply_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.snap");
        let handler = CommandHandler::new(Arc::new(StorageEngine::new()), &path);
        for i in 0..500 {
            run(&handler, &["SET", &format!("key:{}", i), "value"]);
        }

        let clients: Vec<_> = (0..4)
            .map(|_| {
                let handler = handler.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| run(&handler, &["SAVE"]))
                        .filter(|reply| reply != "OK")
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for client in clients {
            assert_eq!(client.join().unwrap(), Vec::<String>::new());
        }
        assert_eq!(StorageEngine::open(&path).unwrap().len(), 500);
    }

    #[test]
    fn test_save_inside_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.snap");
        let handler = CommandHandler::new(Arc::new(StorageEngine::new()), &path);

        let batch = vec![make_command(&["SET", "a", "1"]), make_command(&["SAVE"])];
        assert_eq!(
            handler.execute_batch(&batch),
            Reply::Batch(vec!["OK".to_string(), "OK".to_string()])
        );
        assert!(path.exists());
    }

    #[test]
    fn test_save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        // Parent of the snapshot is a regular file, so the save cannot succeed
        let handler =
            CommandHandler::new(Arc::new(StorageEngine::new()), blocker.join("db.snap"));

        let reply = run(&handler, &["SAVE"]);
        assert!(reply.starts_with("(error) ERR snapshot failed: "), "{}", reply);
    }
}
