use crate::*;
use cs_core::{Role, TranscriptEntry};
use cs_weights::WeightStore;
use tempfile::TempDir;

/// Deploy-then-logs transcript: messages 1-3 share 部署, 4-5 share 日志.
fn deploy_logs_transcript() -> Vec<TranscriptEntry> {
    vec![
        TranscriptEntry::user("如何 部署 服务"),
        TranscriptEntry::assistant("部署 服务 需要 配置"),
        TranscriptEntry::user("部署 完成 没有"),
        TranscriptEntry::user("查看 日志 输出"),
        TranscriptEntry::assistant("日志 显示 正常"),
    ]
}

fn engine_in(tmp: &TempDir) -> ContextEngine {
    ContextEngine::with_weight_file(tmp.path().join("weights.json"))
}

fn processed_engine(tmp: &TempDir) -> ContextEngine {
    let mut engine = engine_in(tmp);
    engine.process_messages(&deploy_logs_transcript());
    engine
}

// ========== Processing ==========

#[test]
fn test_process_messages_builds_cards() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    let cards = engine.process_messages(&deploy_logs_transcript());
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].card_id, "card_0");
    assert_eq!(cards[1].card_id, "card_1");
}

#[test]
fn test_process_empty_transcript() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    assert!(engine.process_messages(&[]).is_empty());
    assert!(engine.api_context("任何消息").is_empty());
}

#[test]
fn test_reprocess_replaces_cards() {
    let tmp = TempDir::new().unwrap();
    let mut engine = processed_engine(&tmp);
    engine.process_messages(&[TranscriptEntry::user("单条 消息")]);
    assert_eq!(engine.cards().len(), 1);
}

// ========== Relevance ==========

#[test]
fn test_find_related_cards() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    assert_eq!(engine.find_related_cards("重新 部署"), vec![0]);
    assert_eq!(engine.find_related_cards("日志 呢"), vec![1]);
    assert!(engine.find_related_cards("完全无关的话").is_empty());
}

#[test]
fn test_find_related_cards_union() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    assert_eq!(engine.find_related_cards("部署 和 日志"), vec![0, 1]);
}

#[test]
fn test_find_related_before_processing() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_in(&tmp);
    assert!(engine.find_related_cards("部署").is_empty());
}

// ========== Weight Updates ==========

#[test]
fn test_update_card_weight() {
    let tmp = TempDir::new().unwrap();
    let mut engine = processed_engine(&tmp);
    let related = engine.update_card_weight("重新 部署").unwrap();
    assert_eq!(related, vec![0]);
    assert!((engine.cards()[0].dynamic_weight - 0.5).abs() < 1e-9);
    assert_eq!(engine.cards()[1].dynamic_weight, 0.0);
}

#[test]
fn test_weight_survives_restart() {
    let tmp = TempDir::new().unwrap();
    {
        let mut engine = processed_engine(&tmp);
        engine.update_card_weight("重新 部署").unwrap();
    }
    let engine = processed_engine(&tmp);
    assert!((engine.cards()[0].dynamic_weight - 0.5).abs() < 1e-9);
}

#[test]
fn test_weight_accumulates_per_mention() {
    let tmp = TempDir::new().unwrap();
    let mut engine = processed_engine(&tmp);
    engine.update_card_weight("重新 部署").unwrap();
    engine.update_card_weight("继续 部署").unwrap();
    assert!((engine.cards()[0].dynamic_weight - 1.0).abs() < 1e-9);
}

#[test]
fn test_update_unrelated_message_is_noop() {
    let tmp = TempDir::new().unwrap();
    let mut engine = processed_engine(&tmp);
    let related = engine.update_card_weight("完全无关的话").unwrap();
    assert!(related.is_empty());
    assert!(engine.weights().is_empty());
}

// ========== Context Assembly ==========

#[test]
fn test_last_card_fully_expanded() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    let context = engine.api_context("");
    // card_0 collapses to one line, card_1 (2 messages) stays verbatim
    assert_eq!(context.len(), 3);
    assert_eq!(context[1].content, "查看 日志 输出");
    assert_eq!(context[1].role, Role::User);
    assert_eq!(context[2].content, "日志 显示 正常");
    assert_eq!(context[2].role, Role::Assistant);
}

#[test]
fn test_current_card_completeness() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    let last_card = engine.cards().last().unwrap();
    let context = engine.api_context("部署");
    let expanded = context
        .iter()
        .filter(|entry| {
            last_card
                .messages
                .iter()
                .any(|m| m.original_content == entry.content)
        })
        .count();
    assert_eq!(expanded, last_card.message_count());
}

#[test]
fn test_related_card_summarized() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    let context = engine.api_context("重新 部署");
    assert!(context[0].content.starts_with("[相关背景] "));
    assert!(context[0].content.contains("如何 部署 服务|部署 服务 需要 配置|部署 完成 没有"));
    assert_eq!(context[0].role, Role::User);
}

#[test]
fn test_unrelated_card_minimal() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    let context = engine.api_context("");
    assert_eq!(context[0].content, engine.cards()[0].minimal());
    assert!(!context[0].content.starts_with("[相关背景]"));
}

#[test]
fn test_warm_card_summarized_without_mention() {
    let tmp = TempDir::new().unwrap();
    let mut engine = processed_engine(&tmp);
    engine.update_card_weight("重新 部署").unwrap();
    // new message says nothing about card_0, but its weight keeps it warm
    let context = engine.api_context("随便 聊聊");
    assert!(context[0].content.starts_with("[相关背景]"));
}

#[test]
fn test_context_order_follows_cards() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    let mut entries = Vec::new();
    for topic in ["部署 服务", "日志 排查", "配置 权限", "性能 优化"] {
        for i in 0..4 {
            entries.push(TranscriptEntry::user(format!("{topic} 问题 {i}")));
        }
    }
    engine.process_messages(&entries);
    let cards = engine.cards().len();
    assert!(cards >= 2);
    let context = engine.api_context("");
    // one entry per earlier card, then the last card verbatim
    let last_count = engine.cards().last().unwrap().message_count();
    assert_eq!(context.len(), cards - 1 + last_count);
}

#[test]
fn test_single_card_transcript_all_verbatim() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    engine.process_messages(&[
        TranscriptEntry::user("部署 服务"),
        TranscriptEntry::assistant("部署 完成"),
    ]);
    let context = engine.api_context("");
    assert_eq!(context.len(), 2);
    assert_eq!(context[0].content, "部署 服务");
}

// ========== Token Accounting ==========

#[test]
fn test_context_tokens_breakdown() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    let tokens = engine.context_tokens("重新 部署");
    assert!(tokens.context_tokens > 0);
    assert!(tokens.current_message_tokens > 0);
    assert_eq!(
        tokens.total_tokens,
        tokens.context_tokens + tokens.current_message_tokens
    );
}

#[test]
fn test_context_tokens_empty_engine() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_in(&tmp);
    let tokens = engine.context_tokens("");
    assert_eq!(tokens.total_tokens, 0);
}

// ========== Compression Stats ==========

#[test]
fn test_compression_stats_zero_when_empty() {
    let tmp = TempDir::new().unwrap();
    let engine = engine_in(&tmp);
    let stats = engine.compression_stats();
    assert_eq!(stats.original_tokens, 0);
    assert_eq!(stats.compression_ratio, "0.0%");
}

#[test]
fn test_compression_stats_with_long_messages() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    let long = format!("部署 方案 说明。{}。结束 总结", "中间还有很多非常详细的内容".repeat(10));
    engine.process_messages(&[TranscriptEntry::user(long)]);
    let stats = engine.compression_stats();
    assert!(stats.saved_tokens > 0);
    assert!(stats.compression_ratio.ends_with('%'));
    assert_eq!(
        stats.saved_tokens,
        stats.original_tokens - stats.compressed_tokens
    );
}

// ========== Summary & Export ==========

#[test]
fn test_cards_summary_lines() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    let summary = engine.cards_summary();
    assert_eq!(summary.lines().count(), 2);
    assert!(summary.starts_with("【部署、服务、如何】"));
}

#[test]
fn test_export_cards() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    let exports = engine.export_cards();
    assert_eq!(exports.len(), 2);
    assert_eq!(exports[0].card_id, "card_0");
    assert_eq!(exports[0].renderings.minimal, engine.cards()[0].minimal());
    assert_eq!(exports[1].messages.len(), 2);
}

#[test]
fn test_export_serializes() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    let json = serde_json::to_string(&engine.export_cards()).unwrap();
    assert!(json.contains("card_0"));
    assert!(json.contains("minimal"));
}

// ========== Reports ==========

#[test]
fn test_report_capture() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    let report = engine.report("重新 部署");
    assert_eq!(report.cards.len(), 2);
    assert_eq!(report.related_cards, vec![0]);
    assert_eq!(report.entries.len(), 3);
    assert_eq!(report.tokens.total_tokens, engine.context_tokens("重新 部署").total_tokens);
}

#[test]
fn test_report_tier_tokens_ordered() {
    let tmp = TempDir::new().unwrap();
    let engine = processed_engine(&tmp);
    let report = engine.report("");
    for card in &report.cards {
        assert!(card.tier_tokens.minimal >= 1);
        assert!(card.tier_tokens.full >= card.tier_tokens.minimal);
    }
}

#[test]
fn test_report_previews_clipped() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    let long = format!("部署 {}", "说明内容 ".repeat(40));
    engine.process_messages(&[TranscriptEntry::user(long)]);
    let report = engine.report("");
    assert!(report.entries[0].preview.chars().count() <= 83);
}

#[test]
fn test_engine_with_injected_segmenter() {
    use cs_analyzer::LexiconSegmenter;
    use cs_core::EngineConfig;

    let tmp = TempDir::new().unwrap();
    let lexicon = LexiconSegmenter::new(["机器学习".to_string()]);
    let mut engine = ContextEngine::with_segmenter(
        Box::new(lexicon),
        EngineConfig::default(),
        WeightStore::open(tmp.path().join("weights.json")),
    );
    let cards = engine.process_messages(&[TranscriptEntry::user("机器学习模型")]);
    assert!(cards[0].keywords.contains(&"机器学习".to_string()));
}

// ========== Example Scenario ==========

#[test]
fn test_deploy_logs_scenario() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine_in(&tmp);
    let cards = engine.process_messages(&deploy_logs_transcript());

    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].message_count(), 3);
    assert_eq!(cards[1].message_count(), 2);
    assert_eq!(cards[0].importance_level, 2);
    assert_eq!(cards[1].importance_level, 5);

    let context = engine.api_context("部署");
    // card_0: related summary; card_1: both messages verbatim
    assert_eq!(context.len(), 3);
    assert!(context[0].content.starts_with("[相关背景]"));
    assert_eq!(context[1].content, "查看 日志 输出");
    assert_eq!(context[2].content, "日志 显示 正常");
}
