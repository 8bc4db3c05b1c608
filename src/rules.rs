pub(crate) mod util;

pub mod equivalences;
pub mod errors;
pub mod tips;

use crate::lint::RuleRegistry;

// Error lints
pub use errors::{NullableRegexLint, UselessCircumflexLint, UselessDollarLint};

// Tip lints
pub use tips::{
    CommonSubexpressionLint, ExactMatchSuggestionLint, SpaceCharsetToShorthandLint,
    SpaceCharsetWithOptionalQuantLint, SpaceCharsetWithoutQuantLint, SubpatternWithoutBackrefLint,
};

// Equivalence lints
pub use equivalences::{
    AltEpsilonToOptionalQuantLint, AlternationOfSingleCharsLint, ConsecutiveQuantifiersLint,
    EmptyGroupingLint, EmptySubpatternLint, OptionalQuantToAltEpsilonLint, QuantifierShorthandLint,
    RepeatedAssertionsLint, SingleCharCharsetLint, TrivialQuantifierLint, UselessGroupingLint,
    UselessSubpatternLint,
};

/// Every rule in catalog order: errors, then tips, then equivalences.
pub fn all_rules() -> RuleRegistry {
    RuleRegistry::new()
        .with_rule(NullableRegexLint)
        .with_rule(UselessCircumflexLint)
        .with_rule(UselessDollarLint)
        .with_rule(SpaceCharsetToShorthandLint)
        .with_rule(SpaceCharsetWithoutQuantLint)
        .with_rule(SpaceCharsetWithOptionalQuantLint)
        .with_rule(SubpatternWithoutBackrefLint)
        .with_rule(ExactMatchSuggestionLint)
        .with_rule(CommonSubexpressionLint::default())
        .with_rule(RepeatedAssertionsLint)
        .with_rule(EmptyGroupingLint)
        .with_rule(UselessGroupingLint)
        .with_rule(EmptySubpatternLint)
        .with_rule(UselessSubpatternLint)
        .with_rule(SingleCharCharsetLint)
        .with_rule(AlternationOfSingleCharsLint)
        .with_rule(QuantifierShorthandLint)
        .with_rule(TrivialQuantifierLint)
        .with_rule(AltEpsilonToOptionalQuantLint)
        .with_rule(OptionalQuantToAltEpsilonLint)
        .with_rule(ConsecutiveQuantifiersLint)
}
