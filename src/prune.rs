//! Sliding-window pruning of tool-result screenshots.
//!
//! Screenshots lose relevance as the conversation ages, but each retained
//! one costs payload size on every call. The pruner drops the oldest
//! tool-result images in place, in chunks, so the provider's incremental
//! prompt cache is not invalidated by every single-image fluctuation.

use crate::messages::{ContentBlock, Message};

/// Images are removed in multiples of this chunk size.
pub const IMAGE_CHUNK_FLOOR: usize = 10;

/// Bound the number of retained tool-result images to roughly `keep`.
///
/// Only images nested inside tool results are candidates; standalone
/// assistant-authored images are never touched. `keep: None` means
/// unbounded retention. Mutates `history` in place, oldest images first.
pub fn prune_images(history: &mut [Message], keep: Option<usize>, chunk_floor: usize) {
    let Some(keep) = keep else {
        return;
    };

    let total_images: usize = history
        .iter()
        .flat_map(|msg| msg.content.iter())
        .map(|block| match block {
            ContentBlock::ToolResult { content, .. } => {
                content.iter().filter(|item| item.is_image()).count()
            }
            _ => 0,
        })
        .sum();

    let mut to_remove = total_images.saturating_sub(keep);
    // Remove in chunks to keep the request prefix stable across calls.
    to_remove -= to_remove % chunk_floor.max(1);
    if to_remove == 0 {
        return;
    }

    tracing::debug!(total_images, to_remove, "pruning tool-result images");

    for message in history.iter_mut() {
        for block in message.content.iter_mut() {
            if let ContentBlock::ToolResult { content, .. } = block {
                content.retain(|item| {
                    if to_remove > 0 && item.is_image() {
                        to_remove -= 1;
                        false
                    } else {
                        true
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ImageData, ResultItem, ResultStatus, Role};

    fn result_message(images: usize) -> Message {
        let mut content = vec![ResultItem::Text("ok".into())];
        content.extend((0..images).map(|_| ResultItem::Image(ImageData::Base64("AQID".into()))));
        Message::new(
            Role::User,
            vec![ContentBlock::ToolResult {
                tool_use_id: "t".into(),
                content,
                status: ResultStatus::Success,
            }],
        )
    }

    fn count_images(history: &[Message]) -> usize {
        history
            .iter()
            .flat_map(|m| m.content.iter())
            .map(|b| match b {
                ContentBlock::ToolResult { content, .. } => {
                    content.iter().filter(|i| i.is_image()).count()
                }
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn twenty_five_images_keep_ten_removes_oldest_chunk() {
        // 25 images, keep 10: to_remove = 15 - 15 % 10 = 10, 15 remain.
        let mut history: Vec<Message> = (0..5).map(|_| result_message(5)).collect();
        prune_images(&mut history, Some(10), IMAGE_CHUNK_FLOOR);
        assert_eq!(count_images(&history), 15);
        // Oldest first: the first two tool results lost all their images.
        assert_eq!(count_images(&history[..2]), 0);
        assert_eq!(count_images(&history[2..]), 15);
    }

    #[test]
    fn below_chunk_floor_is_a_no_op() {
        let mut history = vec![result_message(14)];
        prune_images(&mut history, Some(10), IMAGE_CHUNK_FLOOR);
        // to_remove = 4, rounded down to 0.
        assert_eq!(count_images(&history), 14);
    }

    #[test]
    fn unset_keep_retains_everything() {
        let mut history = vec![result_message(40)];
        prune_images(&mut history, None, IMAGE_CHUNK_FLOOR);
        assert_eq!(count_images(&history), 40);
    }

    #[test]
    fn pruning_is_idempotent() {
        let mut once: Vec<Message> = (0..5).map(|_| result_message(5)).collect();
        prune_images(&mut once, Some(10), IMAGE_CHUNK_FLOOR);
        let after_once = count_images(&once);

        prune_images(&mut once, Some(10), IMAGE_CHUNK_FLOOR);
        assert_eq!(count_images(&once), after_once);
    }

    #[test]
    fn standalone_images_are_never_candidates() {
        let mut history = vec![
            Message::new(
                Role::Assistant,
                vec![ContentBlock::Image {
                    bytes: vec![1, 2, 3],
                }],
            ),
            result_message(20),
        ];
        prune_images(&mut history, Some(0), IMAGE_CHUNK_FLOOR);
        assert_eq!(count_images(&history), 0);
        // The assistant-authored image block is untouched.
        assert!(matches!(history[0].content[0], ContentBlock::Image { .. }));
    }

    #[test]
    fn text_items_survive_pruning() {
        let mut history = vec![result_message(10)];
        prune_images(&mut history, Some(0), IMAGE_CHUNK_FLOOR);
        match &history[0].content[0] {
            ContentBlock::ToolResult { content, .. } => {
                assert_eq!(content.len(), 1);
                assert!(matches!(&content[0], ResultItem::Text(t) if t == "ok"));
            }
            other => panic!("{other:?}"),
        }
    }
}
