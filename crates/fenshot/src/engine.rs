//! Best-move lookup through an external UCI engine.

use std::borrow::Cow;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use fenshot_position::{is_valid_fen, Fen, Square};
use log::{debug, warn};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Position};

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("failed to start engine {path:?}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uci: {0}")]
    Uci(String),
    #[error("engine suggested {mv}, which is not legal in {fen}")]
    IllegalMove { mv: String, fen: String },
    #[error("unexpected engine reply {0:?}")]
    Protocol(String),
}

fn uci_err(e: impl std::fmt::Display) -> EngineError {
    EngineError::Uci(e.to_string())
}

/// Something that can suggest a move for a position.
pub trait ChessEngine {
    /// `Ok(None)` when the engine reports no move.
    fn best_move(&mut self, fen: &Fen) -> Result<Option<UciMove>, EngineError>;
}

/// FEN text the engine side accepts: a zero fullmove counter is read as 1.
fn engine_fen_text(fen: &Fen) -> String {
    fen.clone()
        .with_counters(fen.halfmove, fen.fullmove.max(1))
        .to_string()
}

/// `fen` as a playable `shakmaty` position: both kings present, no pawns on
/// the back ranks, the side not to move not in check.
pub(crate) fn playable_position(fen: &Fen) -> Result<Chess, String> {
    let setup = engine_fen_text(fen).parse::<shakmaty::fen::Fen>().map_err(|e| e.to_string())?;
    setup
        .into_position(CastlingMode::Standard)
        .map_err(|e| e.to_string())
}

/// Ask `engine` only for positions it can search.
///
/// Malformed FEN, positions `shakmaty` rejects (missing kings, the side not
/// to move in check) and positions without a legal move all give `Ok(None)`
/// without consulting the engine. The returned move is checked for legality.
pub fn best_move_for<E: ChessEngine + ?Sized>(
    engine: &mut E,
    fen: &Fen,
) -> Result<Option<UciMove>, EngineError> {
    let text = fen.to_string();
    if !is_valid_fen(&text) {
        warn!("not consulting the engine for malformed FEN {text:?}");
        return Ok(None);
    }

    let position = match playable_position(fen) {
        Ok(pos) => pos,
        Err(reason) => {
            warn!("not consulting the engine for {text:?}: {reason}");
            return Ok(None);
        }
    };
    if position.legal_moves().is_empty() {
        debug!("no legal move in {text:?}");
        return Ok(None);
    }

    let Some(mv) = engine.best_move(fen)? else {
        return Ok(None);
    };
    mv.to_move(&position)
        .map_err(|_| EngineError::IllegalMove {
            mv: mv.to_string(),
            fen: text,
        })?;
    Ok(Some(mv))
}

/// Origin and destination of a board move; `None` for drops and null moves.
pub fn move_squares(mv: &UciMove) -> Option<(Square, Square)> {
    match mv {
        UciMove::Normal { from, to, .. } => {
            Some((from.to_string().parse().ok()?, to.to_string().parse().ok()?))
        }
        _ => None,
    }
}

/// UCI conversation over any line-oriented transport.
pub struct UciSession<R, W> {
    engine: ruci::Engine<R, W>,
    depth: usize,
}

impl<R: BufRead, W: Write> UciSession<R, W> {
    /// Wrap a transport and run the `uci` / `isready` handshake.
    pub fn handshake(reader: R, writer: W, depth: usize) -> Result<Self, EngineError> {
        Self::new(
            ruci::Engine {
                engine: reader,
                gui: writer,
                strict: false,
            },
            depth,
        )
    }

    pub fn new(mut engine: ruci::Engine<R, W>, depth: usize) -> Result<Self, EngineError> {
        engine.use_uci(|_| {}).map_err(uci_err)?;
        engine.is_ready().map_err(uci_err)?;
        Ok(Self { engine, depth })
    }

    /// Outgoing side of the transport.
    pub fn writer(&self) -> &W {
        &self.engine.gui
    }

    pub fn quit(&mut self) -> Result<(), EngineError> {
        self.engine.send(ruci::Quit {}).map_err(uci_err)
    }
}

impl<R: BufRead, W: Write> ChessEngine for UciSession<R, W> {
    fn best_move(&mut self, fen: &Fen) -> Result<Option<UciMove>, EngineError> {
        let text = engine_fen_text(fen);
        let parsed = text
            .parse()
            .map_err(|e| EngineError::Uci(format!("{text:?}: {e}")))?;
        self.engine
            .send(&ruci::Position::Fen {
                fen: Cow::Owned(parsed),
                moves: Cow::Borrowed(&[]),
            })
            .map_err(uci_err)?;

        let best = self
            .engine
            .go(
                &ruci::Go {
                    depth: Some(self.depth),
                    ..Default::default()
                },
                |_| {},
            )
            .map_err(uci_err)?;

        let Some(normal) = best.take_normal() else {
            debug!("uci< bestmove (none)");
            return Ok(None);
        };
        let reply = normal.r#move.to_string();
        debug!("uci< bestmove {reply}");
        match reply.parse::<UciMove>() {
            Ok(UciMove::Null) => Ok(None),
            Ok(mv) => Ok(Some(mv)),
            Err(_) => Err(EngineError::Protocol(reply)),
        }
    }
}

/// A UCI engine running as a child process.
pub struct UciEngine {
    process: Child,
    session: UciSession<BufReader<ChildStdout>, ChildStdin>,
}

impl UciEngine {
    pub fn spawn(path: impl AsRef<Path>, depth: usize) -> Result<Self, EngineError> {
        let path = path.as_ref();
        debug!("starting engine {}", path.display());
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: path.display().to_string(),
                source,
            })?;

        let session = ruci::Engine::from_process(&mut process, false)
            .map_err(uci_err)
            .and_then(|engine| UciSession::new(engine, depth));
        match session {
            Ok(session) => Ok(Self { process, session }),
            Err(e) => {
                let _ = process.kill();
                let _ = process.wait();
                Err(e)
            }
        }
    }
}

impl ChessEngine for UciEngine {
    fn best_move(&mut self, fen: &Fen) -> Result<Option<UciMove>, EngineError> {
        self.session.best_move(fen)
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.session.quit();
        if self.process.wait().is_err() {
            let _ = self.process.kill();
        }
    }
}
