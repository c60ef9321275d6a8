//! The semantic completer: requests in, engine sessions in the middle,
//! editor responses out.

use std::path::Path;
use std::sync::Arc;

use super::request::{Command, Request};
use crate::config::{CompleterConfig, Settings};
use crate::diff::change_set_to_fixit;
use crate::engine::{
    ChangeSet, Definition, Engine, EngineGuard, EngineResult, EngineSession, Signature,
};
use crate::error::{BrokerError, BrokerResult};
use crate::navigation::{DefinitionOracle, HopQuery, ImplementationWalk, SourceLines};
use crate::resolver::ResolutionCache;
use crate::resolver::registry::{HookRegistry, ProjectFileHooks};
use crate::responses::{
    CandidateLocation, CommandResponse, CompletionCandidate, DebugInfo, DebugInfoItem,
    FixItResponse, GoToResponse, ParameterInfo, SignatureHelp, SignatureInfo,
};
use crate::types::{DefinitionLocation, FileKey};

/// Characters after which signature help is offered
pub const SIGNATURE_TRIGGERS: &[&str] = &["(", ","];

pub struct SemanticCompleter {
    config: CompleterConfig,
    guard: Arc<EngineGuard>,
    cache: ResolutionCache,
}

impl SemanticCompleter {
    pub fn new(
        config: CompleterConfig,
        engine: Arc<dyn Engine>,
        hooks: Arc<dyn HookRegistry>,
    ) -> Self {
        let guard = Arc::new(EngineGuard::new(engine));
        let cache = ResolutionCache::new(
            guard.clone(),
            hooks,
            config.language.clone(),
            config.python_binary_path.clone(),
        );
        Self {
            config,
            guard,
            cache,
        }
    }

    /// Completer reading per-project hook files named in the settings.
    pub fn from_settings(settings: &Settings, engine: Arc<dyn Engine>) -> Self {
        let hooks = Arc::new(ProjectFileHooks::new(
            settings.completer.hook_file_name.clone(),
        ));
        Self::new(settings.completer.clone(), engine, hooks)
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn supported_filetypes(&self) -> Vec<String> {
        vec![self.config.language.clone()]
    }

    pub fn signature_triggers(&self) -> &'static [&'static str] {
        SIGNATURE_TRIGGERS
    }

    /// Resolve everything the file needs ahead of the first real request.
    pub fn on_file_ready_to_parse(&self, request: &Request) -> BrokerResult<()> {
        let key = request.key();
        self.cache.runtime_for(&key)?;
        self.cache.project_for(&key)?;
        Ok(())
    }

    /// Open a session on `path` and run `f` on it, all under the engine guard.
    ///
    /// Resolution happens first, outside the guard, since cache misses take
    /// the guard themselves.
    fn with_session<R>(
        &self,
        key: &FileKey,
        source: &str,
        f: impl FnOnce(&dyn EngineSession) -> EngineResult<R>,
    ) -> BrokerResult<R> {
        let resolved = self.cache.resolve(key)?;
        let result = self.guard.with(|engine| {
            let session =
                engine.open_session(source, key.path(), &resolved.project, &resolved.runtime)?;
            f(session.as_ref())
        })?;
        Ok(result)
    }

    fn with_request_session<R>(
        &self,
        request: &Request,
        f: impl FnOnce(&dyn EngineSession) -> EngineResult<R>,
    ) -> BrokerResult<R> {
        let source = request.contents(&request.filepath)?;
        self.with_session(&request.key(), &source, f)
    }

    pub fn compute_candidates(&self, request: &Request) -> BrokerResult<Vec<CompletionCandidate>> {
        let at = request.start_position();
        let completions = self.with_request_session(request, |session| session.complete(at))?;
        tracing::debug!(
            "{} completions at {}:{}",
            completions.len(),
            request.filepath.display(),
            at.line
        );

        Ok(completions
            .into_iter()
            .map(|completion| CompletionCandidate {
                insertion_text: completion.complete.clone(),
                extra_menu_info: None,
                detailed_info: None,
                kind: None,
                extra_data: None,
                pending: Some(completion),
            })
            .collect())
    }

    /// Fill in menu info, docs, kind and location of candidates not yet detailed.
    pub fn detail_candidates(&self, candidates: &mut [CompletionCandidate]) {
        for candidate in candidates {
            let Some(completion) = candidate.pending.take() else {
                continue;
            };
            let definition = &completion.definition;
            candidate.extra_menu_info = Some(type_info(definition));
            candidate.detailed_info = Some(definition.docstring.clone());
            candidate.kind = Some(definition.kind.clone());
            candidate.extra_data = candidate_location(definition);
        }
    }

    pub fn compute_signatures(&self, request: &Request) -> BrokerResult<SignatureHelp> {
        let at = request.start_position();
        let signatures = self.with_request_session(request, |session| session.signatures(at))?;
        Ok(signature_help(signatures))
    }

    /// Run one subcommand.
    pub fn run_command(
        &self,
        request: &Request,
        command: Command,
        args: &[String],
    ) -> BrokerResult<CommandResponse> {
        tracing::debug!("running {command} on {}", request.filepath.display());
        match command {
            Command::GoTo | Command::GoToDefinition | Command::GoToDeclaration => {
                self.goto_definition(request).map(CommandResponse::GoTo)
            }
            Command::GoToImplementation => self
                .goto_implementation(request)
                .map(|location| CommandResponse::GoTo(GoToResponse::Single(location))),
            Command::GoToReferences => self.goto_references(request).map(CommandResponse::GoTo),
            Command::GoToSymbol => self.goto_symbol(request, args).map(CommandResponse::GoTo),
            Command::GoToType => self.goto_type(request).map(CommandResponse::GoTo),
            Command::GetType => self
                .get_type(request)
                .map(|message| CommandResponse::Message { message }),
            Command::GetDoc => self
                .get_doc(request)
                .map(|detailed_info| CommandResponse::DetailedInfo { detailed_info }),
            Command::RefactorRename => {
                let new_name = required_name(args)?;
                let at = request.cursor_position();
                self.refactor(request, "Rename", |session| session.rename(at, new_name))
            }
            Command::RefactorInline => {
                let at = request.cursor_position();
                self.refactor(request, "Inline", |session| session.inline(at))
            }
            Command::RefactorExtractVariable => {
                let new_name = required_name(args)?;
                let (at, until) = (request.cursor_position(), request.range_end());
                self.refactor(request, "Extract variable", |session| {
                    session.extract_variable(at, new_name, until)
                })
            }
            Command::RefactorExtractFunction => {
                let new_name = required_name(args)?;
                let (at, until) = (request.cursor_position(), request.range_end());
                self.refactor(request, "Extract function", |session| {
                    session.extract_function(at, new_name, until)
                })
            }
        }
    }

    fn goto_definition(&self, request: &Request) -> BrokerResult<GoToResponse> {
        let at = request.start_position();
        let definitions = self.with_request_session(request, |session| session.goto(at))?;
        build_goto_response(definitions, &request.filepath)
            .ok_or_else(|| BrokerError::no_result("Can't jump to definition."))
    }

    fn goto_type(&self, request: &Request) -> BrokerResult<GoToResponse> {
        let at = request.start_position();
        let definitions = self.with_request_session(request, |session| session.infer(at))?;
        build_goto_response(definitions, &request.filepath)
            .ok_or_else(|| BrokerError::no_result("Can't jump to type definition."))
    }

    fn goto_references(&self, request: &Request) -> BrokerResult<GoToResponse> {
        let at = request.start_position();
        let definitions = self.with_request_session(request, |session| session.references(at))?;
        build_goto_response(definitions, &request.filepath)
            .ok_or_else(|| BrokerError::no_result("Can't find references."))
    }

    fn goto_symbol(&self, request: &Request, args: &[String]) -> BrokerResult<GoToResponse> {
        let query = args
            .first()
            .ok_or_else(|| BrokerError::invalid_argument("Must specify something to search for"))?;
        let limit = self.config.symbol_limit();
        let definitions =
            self.with_request_session(request, |session| session.search_symbol(query, limit))?;
        build_goto_response(definitions, &request.filepath)
            .ok_or_else(|| BrokerError::no_result("Symbol not found"))
    }

    /// Follow definitions through import lines to the implementation.
    pub fn goto_implementation(&self, request: &Request) -> BrokerResult<DefinitionLocation> {
        let oracle = SessionOracle {
            completer: self,
            request,
        };
        let mut lines = SourceLines::new(request.buffers());
        let walk = ImplementationWalk::new(self.config.implementation_max_hops);
        let found = walk.run(
            HopQuery::new(request.filepath.clone(), request.start_position()),
            &oracle,
            &mut lines,
        )?;
        tracing::info!(
            "implementation found after {} hops ({:?})",
            found.hops,
            found.reason
        );
        Ok(found.location)
    }

    fn get_type(&self, request: &Request) -> BrokerResult<String> {
        let at = request.start_position();
        let definitions = self.with_request_session(request, |session| session.infer(at))?;
        let type_info = definitions
            .iter()
            .map(type_info)
            .collect::<Vec<_>>()
            .join(", ");
        if type_info.is_empty() {
            return Err(BrokerError::no_result("No type information available."));
        }
        Ok(type_info)
    }

    fn get_doc(&self, request: &Request) -> BrokerResult<String> {
        let at = request.start_position();
        let definitions = self.with_request_session(request, |session| session.goto(at))?;
        let documentation = definitions
            .iter()
            .map(|definition| definition.docstring.trim())
            .filter(|doc| !doc.is_empty())
            .collect::<Vec<_>>()
            .join("\n---\n");
        if documentation.is_empty() {
            return Err(BrokerError::no_result("No documentation available."));
        }
        Ok(documentation)
    }

    fn refactor(
        &self,
        request: &Request,
        label: &str,
        f: impl FnOnce(&dyn EngineSession) -> EngineResult<ChangeSet>,
    ) -> BrokerResult<CommandResponse> {
        let changes = self.with_request_session(request, f)?;
        let fixit = change_set_to_fixit(label, &changes)?;
        Ok(CommandResponse::FixIts(FixItResponse {
            fixits: vec![fixit],
        }))
    }

    pub fn debug_info(&self, request: &Request) -> BrokerResult<DebugInfo> {
        let key = request.key();
        let runtime = self.cache.runtime_for(&key)?;
        let project = self.cache.project_for(&key)?;
        let (engine_name, engine_version) = self
            .guard
            .with(|engine| (engine.name().to_string(), engine.version()));

        let sys_path = project
            .sys_path
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>();

        Ok(DebugInfo {
            name: self.config.language.clone(),
            items: vec![
                DebugInfoItem::new("Interpreter", runtime.executable.display().to_string()),
                DebugInfoItem::new("Project root", project.root.display().to_string()),
                DebugInfoItem::new("Search path", format!("{sys_path:?}")),
                DebugInfoItem::new("Runtime version", runtime.version_string()),
                DebugInfoItem::new(format!("{engine_name} version"), engine_version),
            ],
        })
    }
}

/// Single definition hops for the implementation walk.
///
/// Each hop opens a session on the hop's file, with the request's client
/// data and the text the walk classified, and takes the engine guard only
/// for that one query.
struct SessionOracle<'a> {
    completer: &'a SemanticCompleter,
    request: &'a Request,
}

impl DefinitionOracle for SessionOracle<'_> {
    fn definitions(&self, query: &HopQuery, source: &str) -> BrokerResult<Vec<DefinitionLocation>> {
        let key = self.request.key().with_path(query.path.clone());
        let at = query.position;
        let definitions = self
            .completer
            .with_session(&key, source, |session| session.goto(at))?;
        Ok(definitions
            .iter()
            .filter_map(|definition| definition_location(definition, &query.path))
            .collect())
    }
}

fn required_name(args: &[String]) -> BrokerResult<&str> {
    args.first()
        .map(String::as_str)
        .ok_or_else(|| BrokerError::invalid_argument("Must specify a new name"))
}

/// Location of a definition, `None` when the engine gave none at all.
///
/// The path defaults to the requesting file and the line to the first one.
fn definition_location(definition: &Definition, request_path: &Path) -> Option<DefinitionLocation> {
    if definition.is_unlocated() {
        return None;
    }
    let path = definition
        .module_path
        .clone()
        .unwrap_or_else(|| request_path.to_path_buf());
    Some(
        DefinitionLocation::new(
            path,
            definition.line.unwrap_or(1),
            definition.column.unwrap_or(0) + 1,
        )
        .with_description(definition.description.clone()),
    )
}

/// One definition gives a single location, several give a list of the
/// usable ones. `None` when the only definition has no location.
fn build_goto_response(definitions: Vec<Definition>, request_path: &Path) -> Option<GoToResponse> {
    match definitions.as_slice() {
        [] => None,
        [single] => definition_location(single, request_path).map(GoToResponse::Single),
        several => Some(GoToResponse::Multiple(
            several
                .iter()
                .filter_map(|definition| definition_location(definition, request_path))
                .collect(),
        )),
    }
}

/// Description followed by the first signature's parameters.
fn type_info(definition: &Definition) -> String {
    let mut info = definition.description.clone();
    if let Some(signature) = definition.signatures.first() {
        let params = signature
            .params
            .iter()
            .map(|param| param.label())
            .collect::<Vec<_>>()
            .join(", ");
        info.push('(');
        info.push_str(&params);
        info.push(')');
    }
    info
}

fn candidate_location(definition: &Definition) -> Option<CandidateLocation> {
    let path = definition.module_path.clone()?;
    let line = definition.line?;
    let column = definition.column?;
    Some(CandidateLocation {
        location: DefinitionLocation::new(path, line, column + 1),
    })
}

/// Signatures ordered by parameter count, with the active one being the
/// first that knows the cursor's parameter.
fn signature_help(mut signatures: Vec<Signature>) -> SignatureHelp {
    signatures.sort_by_key(|signature| signature.params.len());

    let (active_signature, active_parameter) = signatures
        .iter()
        .enumerate()
        .find_map(|(i, signature)| signature.index.map(|index| (i, index)))
        .unwrap_or((0, 0));

    SignatureHelp {
        active_signature,
        active_parameter,
        signatures: signatures.iter().map(signature_info).collect(),
    }
}

fn signature_info(signature: &Signature) -> SignatureInfo {
    let mut label = format!("{}( ", signature.description);
    let mut parameters = Vec::with_capacity(signature.params.len());

    for (i, param) in signature.params.iter().enumerate() {
        let start = label.len();
        label.push_str(param.label());
        parameters.push(ParameterInfo {
            label: [start, label.len()],
        });
        if i + 1 < signature.params.len() {
            label.push_str(", ");
        }
    }
    label.push_str(" )");

    SignatureInfo { label, parameters }
}
