//! Context assembly: one bounded prompt per request.
//!
//! The prompt is built from up to four layers, always in this order, each
//! emitted only when it has content:
//!
//! 1. **Instruction**, formatted for the operation mode
//! 2. **Structured cues** parsed from the instruction
//! 3. **Project context**, a relevance sample of notes and lore (context-
//!    grounded modes only), each item cut to the sample cap
//! 4. **Selected references**, explicitly chosen items, each cut to the
//!    larger reference cap
//!
//! Each layer depends only on its own inputs and its own cap, so raising a
//! cap never shrinks that layer and never removes another one.
//!
//! # Determinism
//!
//! Identical inputs produce identical prompts. Ordering ties in the sample
//! are broken by update time and then by title.

use inkwell_config::LimitsConfig;
use inkwell_core::{CorpusItem, DraftError, Project};
use inkwell_notation::{StructuredCues, extract_cues};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::sampler::{sample, truncate_chars};
use crate::mode::OperationMode;

pub const PROJECT_HEADER: &str = "[Project Context]";
pub const REFERENCES_HEADER: &str = "[Selected References]";

/// Everything the assembler reads for one request.
pub struct AssemblyInput<'a> {
    /// The raw instruction as typed.
    pub instruction: &'a str,
    pub mode: OperationMode,
    /// The active project, if any.
    pub project: Option<&'a Project>,
    /// Sampling candidates: the active project's items, or the whole corpus.
    pub corpus: &'a [CorpusItem],
    /// Explicitly selected items, already resolved from their ids.
    pub references: &'a [CorpusItem],
}

/// The per-request context blocks, kept for inspection and logging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptContext {
    pub cues: StructuredCues,
    pub project_sample: String,
    pub selected_references: String,
}

/// Sizes and picks behind an assembled prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    pub instruction_chars: usize,
    pub cues_chars: usize,
    pub project_chars: usize,
    pub references_chars: usize,
    /// IDs of the sampled items, best first.
    pub sampled_ids: Vec<String>,
    pub reference_ids: Vec<String>,
}

impl AssemblyMetadata {
    pub fn total_chars(&self) -> usize {
        self.instruction_chars + self.cues_chars + self.project_chars + self.references_chars
    }
}

/// The assembled request: system instruction plus the user-turn text.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub system: String,
    pub prompt: String,
    pub context: PromptContext,
    pub metadata: AssemblyMetadata,
}

/// The context assembler. Stateless apart from its limits.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    limits: LimitsConfig,
}

impl ContextAssembler {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// The pre-request input rules: the character ceiling first, then the
    /// non-empty rule for modes that need an instruction.
    pub fn check_input(&self, instruction: &str, mode: OperationMode) -> Result<(), DraftError> {
        let len = instruction.chars().count();
        if len > self.limits.max_input_chars {
            return Err(DraftError::InputTooLarge {
                len,
                max: self.limits.max_input_chars,
            });
        }
        if instruction.trim().is_empty() && !mode.allows_empty_input() {
            return Err(DraftError::EmptyInput);
        }
        Ok(())
    }

    /// Build the prompt for one request.
    pub fn assemble(&self, input: &AssemblyInput<'_>) -> Result<AssembledPrompt, DraftError> {
        self.check_input(input.instruction, input.mode)?;

        let formatted = input.mode.format_instruction(input.instruction);
        let cues = extract_cues(input.instruction);
        let cues_block = cues.to_block();

        let (project_block, sampled_ids) = if input.mode.is_context_grounded() {
            self.render_project_block(input)
        } else {
            (String::new(), Vec::new())
        };
        let references_block = self.render_references_block(input.references);

        let prompt = [&formatted, &cues_block, &project_block, &references_block]
            .into_iter()
            .filter(|block| !block.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n\n");

        let metadata = AssemblyMetadata {
            instruction_chars: formatted.chars().count(),
            cues_chars: cues_block.chars().count(),
            project_chars: project_block.chars().count(),
            references_chars: references_block.chars().count(),
            sampled_ids,
            reference_ids: input.references.iter().map(|r| r.id().to_string()).collect(),
        };
        debug!(
            mode = %input.mode,
            total_chars = metadata.total_chars(),
            sampled = metadata.sampled_ids.len(),
            references = metadata.reference_ids.len(),
            "Assembled prompt"
        );

        Ok(AssembledPrompt {
            system: input.mode.system_instruction().to_string(),
            prompt,
            context: PromptContext {
                cues,
                project_sample: project_block,
                selected_references: references_block,
            },
            metadata,
        })
    }

    fn render_project_block(&self, input: &AssemblyInput<'_>) -> (String, Vec<String>) {
        let mut lines = Vec::new();
        if let Some(project) = input.project {
            lines.push(format!("Project: {}", project.name));
            if let Some(genre) = project.genre.as_deref().filter(|g| !g.trim().is_empty()) {
                lines.push(format!("Genre: {genre}"));
            }
            if let Some(desc) = project
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
            {
                lines.push(format!("Description: {}", desc.trim()));
            }
        }

        let picked = sample(input.corpus, input.instruction, self.limits.sample_count);
        for item in &picked {
            lines.push(render_item(item, self.limits.sample_char_cap));
        }

        if lines.is_empty() {
            return (String::new(), Vec::new());
        }
        let ids = picked.iter().map(|i| i.id().to_string()).collect();
        (format!("{PROJECT_HEADER}\n{}", lines.join("\n")), ids)
    }

    fn render_references_block(&self, references: &[CorpusItem]) -> String {
        if references.is_empty() {
            return String::new();
        }
        let items: Vec<String> = references
            .iter()
            .map(|r| render_item(r, self.limits.reference_char_cap))
            .collect();
        format!("{REFERENCES_HEADER}\n{}", items.join("\n"))
    }
}

fn render_item(item: &CorpusItem, cap: usize) -> String {
    let content = truncate_chars(item.content(), cap);
    if content.is_empty() {
        format!("- [{}] {}", item.label(), item.title())
    } else {
        format!("- [{}] {}: {}", item.label(), item.title(), content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell_core::{LoreEntry, LoreType, Note};

    fn limits() -> LimitsConfig {
        LimitsConfig::default()
    }

    fn corpus() -> Vec<CorpusItem> {
        vec![
            CorpusItem::Note(Note::new("Harbour", "Fog rolls over the harbour every dawn.")),
            CorpusItem::Lore(
                LoreEntry::new("Kara", LoreType::Character).with_content("A smuggler with debts."),
            ),
        ]
    }

    fn input<'a>(
        instruction: &'a str,
        mode: OperationMode,
        corpus: &'a [CorpusItem],
        references: &'a [CorpusItem],
    ) -> AssemblyInput<'a> {
        AssemblyInput {
            instruction,
            mode,
            project: None,
            corpus,
            references,
        }
    }

    #[test]
    fn oversize_input_is_rejected_before_anything_else() {
        let asm = ContextAssembler::new(LimitsConfig {
            max_input_chars: 5,
            ..limits()
        });
        let err = asm
            .assemble(&input("สวัสดีครับ", OperationMode::Draft, &[], &[]))
            .unwrap_err();
        assert_eq!(err, DraftError::InputTooLarge { len: 10, max: 5 });
    }

    #[test]
    fn empty_input_only_allowed_for_continue() {
        let asm = ContextAssembler::new(limits());
        assert_eq!(
            asm.check_input("   ", OperationMode::Draft),
            Err(DraftError::EmptyInput)
        );
        assert!(asm.check_input("", OperationMode::Continue).is_ok());
    }

    #[test]
    fn layers_appear_in_order() {
        let asm = ContextAssembler::new(limits());
        let corpus = corpus();
        let refs = vec![corpus[1].clone()];
        let out = asm
            .assemble(&input(
                "Kara waits at the harbour\n- Tone: tense",
                OperationMode::Draft,
                &corpus,
                &refs,
            ))
            .unwrap();

        let cues_at = out.prompt.find("[Structured Cues]").unwrap();
        let project_at = out.prompt.find(PROJECT_HEADER).unwrap();
        let refs_at = out.prompt.find(REFERENCES_HEADER).unwrap();
        assert!(out.prompt.starts_with("Kara waits at the harbour"));
        assert!(cues_at < project_at && project_at < refs_at);
        assert_eq!(out.metadata.sampled_ids.len(), 2);
        assert_eq!(out.system, OperationMode::Draft.system_instruction());
    }

    #[test]
    fn ungrounded_modes_skip_the_sample() {
        let asm = ContextAssembler::new(limits());
        let corpus = corpus();
        let out = asm
            .assemble(&input("Kara at the harbour", OperationMode::Critique, &corpus, &[]))
            .unwrap();
        assert!(!out.prompt.contains(PROJECT_HEADER));
        assert!(out.context.project_sample.is_empty());
        assert_eq!(out.prompt, "Kara at the harbour");
    }

    #[test]
    fn project_details_head_the_context_block() {
        let asm = ContextAssembler::new(limits());
        let mut project = Project::new("Saltwind");
        project.genre = Some("Noir".into());
        let out = asm
            .assemble(&AssemblyInput {
                instruction: "a new chapter",
                mode: OperationMode::Brainstorm,
                project: Some(&project),
                corpus: &[],
                references: &[],
            })
            .unwrap();
        assert!(
            out.context
                .project_sample
                .starts_with("[Project Context]\nProject: Saltwind\nGenre: Noir")
        );
    }

    #[test]
    fn references_use_the_larger_cap() {
        let asm = ContextAssembler::new(LimitsConfig {
            sample_char_cap: 4,
            reference_char_cap: 10,
            ..limits()
        });
        let long = vec![CorpusItem::Note(Note::new("Long", "abcdefghijklmnop"))];
        let out = asm
            .assemble(&input("long note", OperationMode::Draft, &long, &long))
            .unwrap();
        assert!(out.context.project_sample.contains("Long: abc…"));
        assert!(out.context.selected_references.contains("Long: abcdefghi…"));
    }

    const CUED: &str = "Kara at the harbour\n- Tone: tense";

    fn wide_corpus() -> Vec<CorpusItem> {
        let mut items = corpus();
        items.push(CorpusItem::Note(Note::new(
            "Lighthouse",
            "The keeper watches the harbour lamps go out one by one.",
        )));
        items
    }

    fn assemble_with(limits: LimitsConfig, corpus: &[CorpusItem]) -> AssembledPrompt {
        ContextAssembler::new(limits)
            .assemble(&input(CUED, OperationMode::Draft, corpus, corpus))
            .unwrap()
    }

    /// The cues, project and references blocks, each checked to be present
    /// in the prompt.
    fn blocks(out: &AssembledPrompt) -> [String; 3] {
        let blocks = [
            out.context.cues.to_block(),
            out.context.project_sample.clone(),
            out.context.selected_references.clone(),
        ];
        for block in &blocks {
            assert!(!block.is_empty());
            assert!(out.prompt.contains(block.as_str()));
        }
        blocks
    }

    #[test]
    fn raising_sample_count_only_grows_the_project_block() {
        let corpus = wide_corpus();
        let mut previous: Option<[String; 3]> = None;
        for count in 1..=3 {
            let out = assemble_with(
                LimitsConfig {
                    sample_count: count,
                    ..limits()
                },
                &corpus,
            );
            let [cues, project, references] = blocks(&out);
            if let Some([prev_cues, prev_project, prev_references]) = &previous {
                assert_eq!(&cues, prev_cues);
                assert_eq!(&references, prev_references);
                assert!(project.starts_with(prev_project.as_str()));
                assert!(project.len() > prev_project.len());
            }
            previous = Some([cues, project, references]);
        }
    }

    #[test]
    fn raising_sample_char_cap_only_grows_the_project_block() {
        let corpus = wide_corpus();
        let mut previous: Option<[String; 3]> = None;
        for cap in [1, 5, 20, 80, 1_000] {
            let out = assemble_with(
                LimitsConfig {
                    sample_char_cap: cap,
                    reference_char_cap: 1_000,
                    ..limits()
                },
                &corpus,
            );
            let [cues, project, references] = blocks(&out);
            if let Some([prev_cues, prev_project, prev_references]) = &previous {
                assert_eq!(&cues, prev_cues);
                assert_eq!(&references, prev_references);
                assert!(project.chars().count() >= prev_project.chars().count());
            }
            previous = Some([cues, project, references]);
        }
    }

    #[test]
    fn raising_reference_char_cap_only_grows_the_references_block() {
        let corpus = wide_corpus();
        let mut previous: Option<[String; 3]> = None;
        for cap in [1, 5, 20, 80, 1_000] {
            let out = assemble_with(
                LimitsConfig {
                    sample_char_cap: 1,
                    reference_char_cap: cap,
                    ..limits()
                },
                &corpus,
            );
            let [cues, project, references] = blocks(&out);
            if let Some([prev_cues, prev_project, prev_references]) = &previous {
                assert_eq!(&cues, prev_cues);
                assert_eq!(&project, prev_project);
                assert!(references.chars().count() >= prev_references.chars().count());
            }
            previous = Some([cues, project, references]);
        }
    }

    #[test]
    fn deterministic_assembly() {
        let asm = ContextAssembler::new(limits());
        let corpus = corpus();
        let a = asm
            .assemble(&input("harbour fog", OperationMode::Draft, &corpus, &[]))
            .unwrap();
        let b = asm
            .assemble(&input("harbour fog", OperationMode::Draft, &corpus, &[]))
            .unwrap();
        assert_eq!(a.prompt, b.prompt);
    }
}
