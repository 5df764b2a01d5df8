//! Rewrite rules turning book-internal references into note-internal ones.
//!
//! Registration order matters, the first matching rule converts a node:
//!
//! 1. [`ImageRule`]: images point into the extracted asset directory
//! 2. [`FootnoteDefinitionRule`]: note bodies become `[^id]: text`
//! 3. [`FootnoteReferenceRule`]: note markers become `[^id]`
//! 4. [`InternalLinkRule`]: everything else with an `href`
//! 5. [`BlockIdRule`]: identified blocks keep a `^id`
//!
//! Rules only read the book-wide maps in [`RewriteContext`]; all tree
//! mutation happens earlier, in [`crate::normalize`].

mod blocks;
mod footnotes;
mod images;
mod links;

pub use blocks::BlockIdRule;
pub use footnotes::{FootnoteDefinitionRule, FootnoteReferenceRule, note_text};
pub use images::ImageRule;
pub use links::InternalLinkRule;

use crate::book::Section;
use crate::convert::RewriteContext;
use crate::markdown::RuleSet;

/// The rule set used to render one section.
pub fn build_rule_set<'a>(ctx: &'a RewriteContext, section: &'a Section) -> RuleSet<'a> {
    let footnotes = &ctx.config.footnotes;
    let mut rules = RuleSet::new();
    rules
        .add(ImageRule::new(&ctx.renames, &ctx.config.assets_dir, section))
        .add(FootnoteDefinitionRule::new(footnotes, &ctx.index))
        .add(FootnoteReferenceRule::new(footnotes))
        .add(InternalLinkRule::new(&ctx.anchors, &ctx.index))
        .add(BlockIdRule);
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConvertConfig;

    #[test]
    fn test_rule_order() {
        let ctx = RewriteContext::new(ConvertConfig::default());
        let section = Section::new("c1", "c1.xhtml");
        let rules = build_rule_set(&ctx, &section);
        assert_eq!(
            rules.names(),
            vec![
                "image",
                "footnote-definition",
                "footnote-reference",
                "internal-link",
                "block-id"
            ]
        );
    }
}
