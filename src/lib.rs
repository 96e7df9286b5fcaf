//! `scriptc` — a compiler front-end for a Lisp-like scripting language used
//! by a first-person-shooter game engine: tokenizer, tree builder, and type
//! resolver, wrapped in a single `Compiler` instance façade. Downstream
//! tooling is expected to serialize the resulting node/script/global arrays
//! into the engine's binary script tag; that serialization step is out of
//! scope here.

mod declarations;
mod definitions;
mod error;
mod node;
mod resolve;
mod token;
mod tree;
mod value_type;

pub use declarations::{Global, Script, MAX_NAME_LENGTH};
pub use error::{CompileError, CompileResult, SyntaxError, WarningKind};
pub use node::{Node, NodeArena, NodeData, NodeIndex};
pub use value_type::{CompileEncoding, CompileTarget, OptimizationLevel, ScriptType, ValueType};

use std::any::Any;

use token::tokenize;

/// A single compilation unit. Accumulates source text across any number of
/// `load_source` calls, then `compile`s the accumulated token buffer in one
/// shot, publishing fresh node/script/global arrays on success.
///
/// Single-threaded and fully synchronous: every mutating operation takes
/// `&mut self`, so the borrow checker — not an internal lock — serializes
/// access to one instance. Distinct instances are fully independent.
pub struct Compiler {
    target: CompileTarget,
    optimization: OptimizationLevel,
    encoding: CompileEncoding,
    warn_callback: Option<Box<dyn FnMut(&str, &str, usize, usize)>>,
    user_data: Option<Box<dyn Any>>,

    files: Vec<String>,
    tokens: Vec<token::Token>,

    last_error: Option<CompileError>,

    nodes: NodeArena,
    scripts: Vec<Script>,
    globals: Vec<Global>,
}

impl Compiler {
    /// Create a new, empty instance targeting `target`. Defaults to
    /// `OptimizationLevel::Paranoid` and `CompileEncoding::Utf8`, no warn
    /// callback, and no user data.
    pub fn new(target: CompileTarget) -> Compiler {
        Compiler {
            target,
            optimization: OptimizationLevel::Paranoid,
            encoding: CompileEncoding::Utf8,
            warn_callback: None,
            user_data: None,
            files: Vec::new(),
            tokens: Vec::new(),
            last_error: None,
            nodes: NodeArena::new(),
            scripts: Vec::new(),
            globals: Vec::new(),
        }
    }

    /// Install the callback invoked synchronously during `compile` for every
    /// non-fatal diagnostic (currently: a script and a global sharing a
    /// name). Replaces any previously set callback.
    pub fn set_warn_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&str, &str, usize, usize) + 'static,
    {
        self.warn_callback = Some(Box::new(callback));
    }

    pub fn set_optimization_level(&mut self, level: OptimizationLevel) {
        self.optimization = level;
    }

    /// Byte codec used to decode source passed to `load_source` from here
    /// on; does not retroactively affect already-tokenized source.
    pub fn set_encoding(&mut self, encoding: CompileEncoding) {
        self.encoding = encoding;
    }

    pub fn set_user_data<T: Any>(&mut self, data: T) {
        self.user_data = Some(Box::new(data));
    }

    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.user_data.as_ref().and_then(|d| d.downcast_ref::<T>())
    }

    pub fn user_data_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.user_data.as_mut().and_then(|d| d.downcast_mut::<T>())
    }

    pub fn target(&self) -> CompileTarget {
        self.target
    }

    /// Tokenize `bytes` and append the result to the accumulated token
    /// buffer. On success, `filename` is recorded in the file-name list (its
    /// index becomes the file tag on every token just produced). On
    /// failure, the file is *not* added to the list, but the last-diagnostic
    /// slot is still populated so `last_error` reflects this call.
    pub fn load_source(&mut self, bytes: &[u8], filename: &str) -> CompileResult<()> {
        let file_index = self.files.len();
        match tokenize(bytes, file_index, filename, self.encoding) {
            Ok(mut new_tokens) => {
                log::debug!("tokenized '{filename}' ({} tokens)", new_tokens.len());
                self.tokens.append(&mut new_tokens);
                self.files.push(filename.to_owned());
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Consume the accumulated token buffer once: build the node graph,
    /// resolve types, replace stubs, compact orphaned nodes, and back-fill
    /// script-call indices. On success, publishes fresh `nodes`/`scripts`/
    /// `globals`, replacing whatever a previous `compile` published. On
    /// failure, previously published results are left untouched and the
    /// last-diagnostic slot is updated.
    ///
    /// The token buffer itself is not cleared, so calling `compile` again
    /// without loading more source reproduces the same result.
    pub fn compile(&mut self) -> CompileResult<()> {
        self.last_error = None;
        match self.compile_inner() {
            Ok(()) => {
                log::info!("compiled {} script(s), {} global(s)", self.scripts.len(), self.globals.len());
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn compile_inner(&mut self) -> CompileResult<()> {
        log::debug!("resolving {} token(s) across {} file(s)", self.tokens.len(), self.files.len());

        let (mut arena, built) = tree::build(&self.tokens, &self.files, self.optimization)?;
        let mut scripts = built.scripts;
        let mut globals = built.globals;

        let mut taken_callback = self.warn_callback.take();
        let mut noop = |_: &str, _: &str, _: usize, _: usize| {};
        let resolved = {
            let warn_fn: &mut dyn FnMut(&str, &str, usize, usize) = match &mut taken_callback {
                Some(cb) => cb.as_mut(),
                None => &mut noop,
            };
            resolve::resolve(&mut arena, &mut scripts, &mut globals, self.target, &self.files, warn_fn)
        };
        self.warn_callback = taken_callback;
        resolved?;

        self.nodes = arena;
        self.scripts = scripts;
        self.globals = globals;
        Ok(())
    }

    /// The last diagnostic recorded by `load_source` or `compile`, whichever
    /// ran most recently. Cleared at the start of every `compile` call.
    pub fn last_error(&self) -> Option<&CompileError> {
        self.last_error.as_ref()
    }

    /// The node array published by the last successful `compile`. Empty
    /// before the first successful compile.
    pub fn nodes(&self) -> &[Node] {
        self.nodes.as_slice()
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    pub fn globals(&self) -> &[Global] {
        &self.globals
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn end_to_end_short_global() {
        let mut c = Compiler::new(CompileTarget::Any);
        c.load_source(b"(global short x 5)", "t.hsc").unwrap();
        c.compile().unwrap();
        assert_eq!(c.globals().len(), 1);
        assert_eq!(c.globals()[0].value_type, ValueType::Short);
    }

    #[test]
    fn last_error_populated_on_failed_load() {
        let mut c = Compiler::new(CompileTarget::Any);
        let err = c.load_source(b"(print \"unterminated", "t.hsc").unwrap_err();
        assert_eq!(c.last_error().unwrap().message(), err.message());
        assert!(c.scripts().is_empty());
    }

    #[test]
    fn failed_compile_leaves_prior_results_untouched() {
        let mut c = Compiler::new(CompileTarget::Any);
        c.load_source(b"(global short x 5)", "a.hsc").unwrap();
        c.compile().unwrap();
        assert_eq!(c.globals().len(), 1);

        c.load_source(b"(global short x 999999)", "b.hsc").unwrap();
        assert!(c.compile().is_err());
        // the first compile's published globals are untouched
        assert_eq!(c.globals().len(), 1);
        assert!(c.last_error().is_some());
    }

    #[test]
    fn recompile_without_new_source_is_idempotent() {
        let mut c = Compiler::new(CompileTarget::Any);
        c.load_source(b"(script static real f (+ 1 2))", "t.hsc").unwrap();
        c.compile().unwrap();
        let first_len = c.nodes().len();
        c.compile().unwrap();
        assert_eq!(c.nodes().len(), first_len);
    }

    #[test]
    fn warn_callback_invoked_on_name_collision() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(false));
        let seen2 = Rc::clone(&seen);

        let mut c = Compiler::new(CompileTarget::Any);
        c.set_warn_callback(move |_, _, _, _| {
            *seen2.borrow_mut() = true;
        });
        c.load_source(b"(global short f 1) (script static void f (begin))", "t.hsc").unwrap();
        c.compile().unwrap();
        assert!(*seen.borrow());
    }

    #[test]
    fn user_data_roundtrips() {
        let mut c = Compiler::new(CompileTarget::Any);
        c.set_user_data(42u32);
        assert_eq!(c.user_data::<u32>(), Some(&42));
        assert_eq!(c.user_data::<String>(), None);
    }

    #[test]
    fn windows_1252_encoding_decodes_source() {
        let mut c = Compiler::new(CompileTarget::Any);
        c.set_encoding(CompileEncoding::Windows1252);
        c.load_source(b"(global short x 5)", "t.hsc").unwrap();
        c.compile().unwrap();
        assert_eq!(c.globals().len(), 1);
    }
}
