// Patch generation
//
// Produces a full-replacement patch for one iteration: a modification
// request, a review pass that tightens the first draft, a granular per-file
// fallback when neither reply parses, and one corrective follow-up per
// proposed file whose content would change nothing on disk.

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

use crate::artifact;
use crate::oracle::{self, Oracle};
use crate::repair::IterationContext;

use super::types::{PatchResponse, PatchSet};

const SYSTEM_PROMPT: &str = "You are an expert software developer. Modify the provided files to \
                             fix the categorized errors and return complete file contents.";

#[derive(Debug, Clone, Default, Deserialize)]
struct UnnecessaryFiles {
    #[serde(default)]
    unnecessary_files: Vec<String>,
}

pub struct PatchGenerator<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> PatchGenerator<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Generate a patch for the iteration context. The review pass and the
    /// granular fallback make the outer result soft: any oracle transport
    /// failure is an error, but parse trouble degrades step by step.
    pub async fn generate(&self, ctx: &IterationContext) -> Result<PatchSet> {
        let draft = oracle::complete(self.oracle, SYSTEM_PROMPT, &modification_prompt(ctx)).await?;
        let mut patch = self.review_and_parse(ctx, &draft).await?;

        for entry in patch.files.iter_mut() {
            let unchanged = ctx
                .files
                .iter()
                .any(|(path, content)| path == &entry.0 && content == &entry.1);
            if !unchanged {
                continue;
            }
            tracing::warn!(
                "Patch for {} returned without any changes; issuing one corrective request",
                entry.0
            );
            let corrected = oracle::complete(
                self.oracle,
                SYSTEM_PROMPT,
                &corrective_prompt(ctx, &entry.0, &entry.1),
            )
            .await?;
            // one follow-up per file; an unusable reply leaves the entry alone
            if let Some(replacement) = extract_file_content(&corrected, &entry.0) {
                entry.1 = replacement;
            }
        }

        let unnecessary = self.detect_unnecessary_files(ctx).await;
        for path in unnecessary {
            let being_written = patch.files.iter().any(|(p, _)| p == &path);
            if !being_written && !patch.deletions.contains(&path) {
                patch.deletions.push(path);
            }
        }

        Ok(patch)
    }

    /// Review pass: ask the oracle to check and maximize the draft, then
    /// parse the tightened reply, falling back to the draft itself.
    async fn review_and_parse(&self, ctx: &IterationContext, draft: &str) -> Result<PatchSet> {
        let prompt = format!(
            "Review the following proposed modifications and maximize the modifications that fix \
             the reported errors. Verify that every modified file is complete and consistent with \
             the other files, and add any further changes that are required to make the tests \
             pass. Do not drop any valid modification from the proposal.\n\n\
             Errors:\n{errors}\n\n\
             Proposed Modifications:\n{draft}\n\n\
             Return the result in JSON format without any explanation.\n\n\
             JSON Format Example:\n\
             {format}",
            errors = serde_json::to_string_pretty(&ctx.errors).unwrap_or_default(),
            draft = draft,
            format = patch_format(),
        );

        match oracle::complete(self.oracle, SYSTEM_PROMPT, &prompt).await {
            Ok(reviewed) => {
                if let Some(response) = artifact::parse_json_object::<PatchResponse>(&reviewed) {
                    return Ok(response.into());
                }
                tracing::warn!("Reviewed patch did not parse; falling back to the draft");
                self.parse_or_fallback(draft).await
            }
            Err(e) => {
                tracing::warn!("Patch review failed ({}); falling back to the draft", e);
                self.parse_or_fallback(draft).await
            }
        }
    }

    /// Parse a modification reply, or recover file by file when the reply
    /// embeds code that breaks the JSON.
    async fn parse_or_fallback(&self, reply: &str) -> Result<PatchSet> {
        if let Some(response) = artifact::parse_json_object::<PatchResponse>(reply) {
            return Ok(response.into());
        }
        tracing::warn!("Modification reply did not parse; recovering file by file");
        self.recover_granularly(reply).await
    }

    /// Granular recovery: extract the file list from the broken reply, then
    /// request each file's full content separately.
    async fn recover_granularly(&self, reply: &str) -> Result<PatchSet> {
        let list_prompt = format!(
            "The following reply contains file modifications but is not valid JSON. List only the \
             file paths it modifies, as a JSON array of strings, without any explanation.\n\n\
             Reply:\n{reply}\n\n\
             JSON Format Example:\n{format}",
            reply = reply,
            format = json!(["path/to/file"]),
        );

        let listed = oracle::complete(self.oracle, SYSTEM_PROMPT, &list_prompt).await?;
        let paths = artifact::parse_json_array::<String>(&listed).unwrap_or_default();

        let mut patch = PatchSet::default();
        for path in paths {
            let content_prompt = format!(
                "From the following reply, return the complete modified content of the file \
                 `{path}`, wrapped in a <gen-file path=\"{path}\"> ... </gen-file> block, with \
                 no other text.\n\n\
                 Reply:\n{reply}",
                path = path,
                reply = reply,
            );
            match oracle::complete(self.oracle, SYSTEM_PROMPT, &content_prompt).await {
                Ok(content) => {
                    let blocks = artifact::parse_gen_file_blocks(&content);
                    match blocks.into_iter().next() {
                        Some((_, body)) => patch.files.push((path, body)),
                        // no block marker, take the reply wholesale
                        None => patch.files.push((path, artifact::clean_block(&content))),
                    }
                }
                Err(e) => tracing::warn!("Granular recovery of {} failed: {}", path, e),
            }
        }
        Ok(patch)
    }

    /// Ask which project files are unnecessary or misplaced. Soft: failures
    /// simply produce no deletions.
    async fn detect_unnecessary_files(&self, ctx: &IterationContext) -> Vec<String> {
        let prompt = format!(
            "Based on the following project structure and test results, identify files that are \
             unnecessary or misplaced, such as duplicated modules, stray artifacts, or files \
             left at the wrong path.\n\n\
             Project Structure:\n{structure}\n\n\
             Test Results:\n{results}\n\n\
             Only list files whose removal helps the tests pass. When in doubt, list nothing.\n\n\
             Return the result in JSON format without any explanation:\n\
             {format}",
            structure = serde_json::to_string_pretty(&ctx.structure).unwrap_or_default(),
            results = ctx.test_results,
            format = json!({"unnecessary_files": ["..."]}),
        );

        match oracle::complete(self.oracle, SYSTEM_PROMPT, &prompt).await {
            Ok(reply) => artifact::parse_json_object::<UnnecessaryFiles>(&reply)
                .map(|u| u.unnecessary_files)
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Unnecessary-file detection failed: {}", e);
                Vec::new()
            }
        }
    }
}

fn patch_format() -> serde_json::Value {
    json!({
        "files": {"path/to/file": "complete file content"},
        "files_to_delete": ["path/to/obsolete/file"]
    })
}

fn modification_prompt(ctx: &IterationContext) -> String {
    format!(
        "Modify the provided files to fix all the categorized errors below. Return the complete \
         content of every file you change; partial files are not acceptable.\n\n\
         Requirement:\n{requirement}\n\n\
         Programming Language:\n{language}\n\n\
         Libraries:\n{libraries}\n\n\
         Test Results:\n{results}\n\n\
         Categorized Errors:\n{errors}\n\n\
         Files:\n{files}\n\n\
         Configuration Files:\n{configuration}\n\n\
         Reflections on Previous Attempts:\n{reflections}\n\n\
         Ensure the following:\n\
         1. Fix critical errors first, then high, medium, and low.\n\
         2. Keep every file consistent with the requirement and with the other files.\n\
         3. Use **files_to_delete** only for files that must be removed entirely.\n\n\
         Return the result in JSON format without any explanation.\n\n\
         JSON Format Example:\n\
         {format}",
        requirement = ctx.requirement,
        language = ctx.language,
        libraries = ctx.libraries.join(", "),
        results = ctx.test_results,
        errors = serde_json::to_string_pretty(&ctx.errors).unwrap_or_default(),
        files = render_files(&ctx.files),
        configuration = serde_json::to_string_pretty(&ctx.configuration_files).unwrap_or_default(),
        reflections = if ctx.reflections.is_empty() {
            "None yet."
        } else {
            ctx.reflections.as_str()
        },
        format = patch_format(),
    )
}

fn corrective_prompt(ctx: &IterationContext, path: &str, current: &str) -> String {
    format!(
        "The previous modification request returned without any changes to `{path}`, but the \
         tests still fail. Re-examine the errors and return a modification that actually \
         changes the file.\n\n\
         Categorized Errors:\n{errors}\n\n\
         File `{path}`:\n{current}\n\n\
         Return the result in JSON format without any explanation.\n\n\
         JSON Format Example:\n\
         {format}",
        path = path,
        errors = serde_json::to_string_pretty(&ctx.errors).unwrap_or_default(),
        current = current,
        format = json!({"files": {path: "complete file content"}, "files_to_delete": []}),
    )
}

/// Pull one file's replacement out of a corrective reply, accepting either
/// the JSON patch shape or a gen-file block.
fn extract_file_content(reply: &str, path: &str) -> Option<String> {
    if let Some(response) = artifact::parse_json_object::<PatchResponse>(reply) {
        if let Some(content) = response.files.get(path) {
            return Some(artifact::clean_block(content));
        }
    }
    artifact::parse_gen_file_blocks(reply)
        .into_iter()
        .find(|(p, _)| p == path)
        .map(|(_, body)| body)
}

fn render_files(files: &[(String, String)]) -> String {
    let mut rendered = String::new();
    for (path, content) in files {
        rendered.push_str(&format!("### {}\n{}\n\n", path, content));
    }
    if rendered.is_empty() {
        rendered.push_str("None provided.");
    }
    rendered
}
