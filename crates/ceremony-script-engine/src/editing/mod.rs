/*!
 * # Editing Core Module
 *
 * Everything that happens between a user action and the content the
 * application stores.
 *
 * ## Architecture Overview
 *
 * ### 1. Owned Editing Surface
 * - `EditorSurface` holds the `Document` tree, the live selection as
 *   (node path, local offset) pairs, the focus flag and the pending
 *   `TypingStyle`
 * - Structural mutations are named `FormatCommand`s run by `exec`
 *
 * ### 2. Selection Survives Restructuring
 * - Before a mutation the selection is captured as linear plain-text
 *   offsets (`SelectionOffsets`)
 * - Wrapping or splitting runs never changes plain text, so the same offsets
 *   are restored onto the reshaped tree afterwards
 *
 * ### 3. Synchronous Settling
 * - Mutations apply to the owned tree immediately; the new content and
 *   offsets come back in a `FormatOutcome` in the same call
 *
 * ### 4. Content Synchronization
 * - `ContentSynchronizer::on_input` copies surface content on every input
 * - `reconcile` only rewrites the surface when the plain text differs
 *
 * ## Module Structure
 *
 * - **`surface`**: `EditorSurface`, `Position`, `Selection`, `TypingStyle`
 * - **`selection`**: capture/restore between positions and linear offsets
 * - **`formatting`**: `FormatCommand`, `FormattingController`, `FormatOutcome`
 * - **`sync`**: `ContentSynchronizer` and `ReconcileOutcome`
 *
 * ## Usage Pattern
 *
 * ```rust
 * use ceremony_script_engine::editing::*;
 *
 * let mut surface = EditorSurface::from_markup("We are gathered");
 * let mut sync = ContentSynchronizer::new(surface.content());
 * let mut controller = FormattingController::default();
 *
 * restore_offsets(&mut surface, SelectionOffsets::new(3, 6));
 * let outcome = controller.apply_format(&mut surface, &mut sync, FormatCommand::Bold);
 *
 * assert_eq!(outcome.content, "We <b>are</b> gathered");
 * assert_eq!(outcome.selection, Some(SelectionOffsets::new(3, 6)));
 * ```
 */

pub mod formatting;
pub mod selection;
pub mod surface;
pub mod sync;

pub use formatting::{FormatCommand, FormatOutcome, FormattingController};
pub use selection::{SelectionOffsets, capture_offsets, restore_offsets};
pub use surface::{EditorSurface, Position, Selection, TypingStyle};
pub use sync::{ContentSynchronizer, ReconcileOutcome};
