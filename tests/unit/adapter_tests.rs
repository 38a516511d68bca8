/*!
 * Unit tests for batch response parsing and the adapter contract.
 */

use transq::providers::mock::MockTranslator;
use transq::translation::adapter::{BatchTranslator, ExchangeContext, parse_batch_response};

fn batch(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_parseBatchResponse_withNumberedLines_shouldYieldCleanTranslations() {
    let result = parse_batch_response("1. X\n2. Y\n3. Z", 3);
    assert_eq!(
        result,
        vec![
            Some("X".to_string()),
            Some("Y".to_string()),
            Some("Z".to_string())
        ]
    );
}

#[test]
fn test_parseBatchResponse_withShortResponse_shouldFillTailWithNone() {
    let result = parse_batch_response("line one\nline two", 3);
    assert_eq!(
        result,
        vec![
            Some("line one".to_string()),
            Some("line two".to_string()),
            None
        ]
    );
}

#[test]
fn test_parseBatchResponse_outputLength_alwaysMatchesInput() {
    for expected in 0..6 {
        for response in ["", "a", "a\nb", "a\nb\nc\nd\ne\nf\ng"] {
            let result = parse_batch_response(response, expected);
            assert_eq!(result.len(), expected);
        }
    }
}

#[tokio::test]
async fn test_translateBatch_outputLength_matchesInputUnderMisbehavior() {
    let texts = batch(&["一", "二", "三", "四"]);

    for translator in [
        MockTranslator::working(),
        MockTranslator::enumerated(),
        MockTranslator::truncated(1),
        MockTranslator::empty(),
    ] {
        let mut context = ExchangeContext::disabled();
        let result = translator
            .translate_batch(&texts, "en", &mut context)
            .await
            .expect("Mock should not error");
        assert_eq!(result.len(), texts.len());
    }
}

#[tokio::test]
async fn test_translateBatch_shouldRecordExchangesInContext() {
    let translator = MockTranslator::working();
    let mut context = ExchangeContext::new(2);

    for _ in 0..3 {
        translator
            .translate_batch(&batch(&["什么是细胞"]), "en", &mut context)
            .await
            .unwrap();
    }

    // Window stays bounded at its capacity
    assert_eq!(context.len(), 2);
}
