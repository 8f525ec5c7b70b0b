//! End-to-end decode scenarios against the bundled tree and cache store.

use std::sync::Arc;

use serde_json::json;
use speaking_url::cache::{CacheStore, MemoryCacheStore, UrlCacheEntry};
use speaking_url::config::{DecoderConfig, ParameterSetConfig};
use speaking_url::decoder::{DecodeOutcome, RequestContext, ResolutionSource, UrlDecoder};

mod common;
use common::{site_tree, CountingTree};

struct Fixture {
    decoder: UrlDecoder,
    tree: CountingTree,
    store: MemoryCacheStore,
}

fn fixture(config: DecoderConfig) -> Fixture {
    let tree = CountingTree::new(site_tree());
    let store = MemoryCacheStore::new(None);
    let decoder = UrlDecoder::new(&config, Arc::new(tree.clone()), Arc::new(store.clone()));
    Fixture { decoder, tree, store }
}

fn decode(decoder: &UrlDecoder, uri: &str) -> (DecodeOutcome, RequestContext) {
    let mut ctx = RequestContext::new(uri);
    let outcome = decoder.decode(&mut ctx).unwrap();
    (outcome, ctx)
}

#[test]
fn test_cold_then_warm_decode() {
    let f = fixture(DecoderConfig::default());

    let (first, ctx) = decode(&f.decoder, "news/2015/article");
    assert!(matches!(
        first,
        DecodeOutcome::Resolved { resource_id: 12, source: ResolutionSource::PathResolver, .. }
    ));
    assert_eq!(ctx.resource_id, 12);
    assert_eq!(f.tree.lookups(), 3);
    assert_eq!(f.store.path_rows(), 3);
    assert_eq!(f.store.url_rows(), 1);

    f.tree.reset();
    let (second, _) = decode(&f.decoder, "news/2015/article");
    assert!(matches!(
        second,
        DecodeOutcome::Resolved { resource_id: 12, source: ResolutionSource::UrlCache, .. }
    ));
    assert_eq!(f.tree.lookups(), 0);
    assert_eq!(f.store.path_rows(), 3);
    assert_eq!(f.store.url_rows(), 1);
}

#[test]
fn test_decode_is_idempotent() {
    let mut config = DecoderConfig::default();
    config.parameter_sets.insert(
        "page".to_string(),
        ParameterSetConfig {
            variables: vec!["tx_list[page]".to_string()],
        },
    );
    let f = fixture(config);

    let (first, first_ctx) = decode(&f.decoder, "news/page/3/?L=0");
    let (second, second_ctx) = decode(&f.decoder, "news/page/3/?L=0");

    let (
        DecodeOutcome::Resolved { resource_id: a, parameters: pa, .. },
        DecodeOutcome::Resolved { resource_id: b, parameters: pb, .. },
    ) = (first, second)
    else {
        panic!("both decodes should resolve");
    };
    assert_eq!(a, 10);
    assert_eq!(a, b);
    assert_eq!(pa, pb);
    assert_eq!(first_ctx.merged_parameters, second_ctx.merged_parameters);
    assert_eq!(first_ctx.decoded_query_string, "tx_list[page]=3&L=0");
    assert_eq!(second_ctx.decoded_query_string, first_ctx.decoded_query_string);
}

#[test]
fn test_prefix_reused_for_longer_paths() {
    let f = fixture(DecoderConfig::default());

    decode(&f.decoder, "news/2015/");
    assert_eq!(f.tree.lookups(), 2);

    f.tree.reset();
    let (outcome, _) = decode(&f.decoder, "news/2015/article/");
    assert!(matches!(outcome, DecodeOutcome::Resolved { resource_id: 12, .. }));
    assert_eq!(f.tree.lookups(), 1);
    assert_eq!(f.store.path_rows(), 3);
}

#[test]
fn test_redirect_halts_before_lookup() {
    let mut config = DecoderConfig::default();
    config.init.append_missing_slash = "redirect".to_string();
    let f = fixture(config);

    let (outcome, ctx) = decode(&f.decoder, "about");
    assert_eq!(
        outcome,
        DecodeOutcome::Redirected {
            target: "/about/".to_string(),
            code: 301
        }
    );
    assert!(ctx.appended_slash);
    assert_eq!(ctx.resource_id, 0);
    assert_eq!(f.tree.lookups(), 0);
    assert_eq!(f.store.url_rows(), 0);
}

#[test]
fn test_redirect_never_leaves_site() {
    let mut config = DecoderConfig::default();
    config.init.append_missing_slash = "redirect".to_string();
    let f = fixture(config);

    for uri in ["/\\evil.example/x", "\\evil.example/x", "\t/evil.example/x", "/\n\\evil.example"] {
        let (outcome, ctx) = decode(&f.decoder, uri);
        assert!(
            !matches!(outcome, DecodeOutcome::Redirected { .. }),
            "{uri:?} produced {outcome:?}"
        );
        assert!(ctx.appended_slash);
    }
}

#[test]
fn test_if_not_file_leaves_files_alone() {
    let mut config = DecoderConfig::default();
    config.init.append_missing_slash = "ifNotFile,redirect[302]".to_string();
    let f = fixture(config);

    let (outcome, ctx) = decode(&f.decoder, "image.png");
    assert!(!ctx.appended_slash);
    assert_eq!(
        outcome,
        DecodeOutcome::NotFound {
            reason: "\"image.png\" could not be decoded from path.".to_string()
        }
    );
}

#[test]
fn test_not_found_names_first_failing_segment() {
    let f = fixture(DecoderConfig::default());

    let (outcome, ctx) = decode(&f.decoder, "nonexistent/page");
    assert_eq!(
        outcome,
        DecodeOutcome::NotFound {
            reason: "\"nonexistent\" could not be decoded from path.".to_string()
        }
    );
    assert_eq!(ctx.resource_id, 0);
    assert_eq!(f.store.path_rows(), 0);
    assert_eq!(f.store.url_rows(), 0);
}

#[test]
fn test_hidden_pages_not_addressable() {
    let f = fixture(DecoderConfig::default());
    let (outcome, _) = decode(&f.decoder, "hidden-page/");
    assert!(matches!(outcome, DecodeOutcome::NotFound { .. }));
}

#[test]
fn test_request_parameters_merged() {
    let mut config = DecoderConfig::default();
    config.parameter_sets.insert(
        "item".to_string(),
        ParameterSetConfig {
            variables: vec!["tx_news[news]".to_string()],
        },
    );
    let f = fixture(config);

    let (_, ctx) = decode(&f.decoder, "news/item/42/?tx_news[controller]=News&cHash=abc");
    assert_eq!(
        serde_json::Value::Object(ctx.merged_parameters.clone()),
        json!({"tx_news": {"controller": "News", "news": "42"}, "cHash": "abc"})
    );
    assert_eq!(
        ctx.decoded_query_string,
        "tx_news[news]=42&cHash=abc&tx_news[controller]=News&cHash=abc"
    );

    let rows = f
        .store
        .find_urls(1, "news/item/42/?tx_news[controller]=News&cHash=abc")
        .unwrap();
    assert_eq!(
        rows[0].original_query,
        "cHash=abc&id=10&tx_news[controller]=News&tx_news[news]=42"
    );
}

#[test]
fn test_languages_cached_separately() {
    let f = fixture(DecoderConfig::default());

    decode(&f.decoder, "about-us/?L=1");
    f.tree.reset();
    let (outcome, ctx) = decode(&f.decoder, "about-us/?L=2");

    assert!(matches!(outcome, DecodeOutcome::Resolved { resource_id: 20, .. }));
    assert_eq!(ctx.language_id, 2);
    assert_eq!(f.tree.lookups(), 1);
    assert_eq!(f.store.path_rows(), 2);
}

#[test]
fn test_direct_invocation_untouched() {
    let f = fixture(DecoderConfig::default());
    let (outcome, ctx) = decode(&f.decoder, "index.php?id=12");
    assert_eq!(outcome, DecodeOutcome::NotSpeakingUrl);
    assert!(ctx.decoded_query_string.is_empty());
    assert_eq!(f.tree.lookups(), 0);
}

#[test]
fn test_corrupt_url_row_is_replaced() {
    let f = fixture(DecoderConfig::default());
    f.store
        .insert_url(UrlCacheEntry {
            root_id: 1,
            speaking_url: "about-us/".to_string(),
            original_query: String::new(),
            payload: "{bad".to_string(),
            created_at: 0,
        })
        .unwrap();

    let (first, _) = decode(&f.decoder, "about-us/");
    assert!(matches!(
        first,
        DecodeOutcome::Resolved { resource_id: 20, source: ResolutionSource::PathResolver, .. }
    ));
    assert_eq!(f.store.url_rows(), 2);

    f.tree.reset();
    let (second, _) = decode(&f.decoder, "about-us/");
    assert!(matches!(
        second,
        DecodeOutcome::Resolved { resource_id: 20, source: ResolutionSource::UrlCache, .. }
    ));
    assert_eq!(f.tree.lookups(), 0);
    assert_eq!(f.store.url_rows(), 2);
}

#[test]
fn test_absolute_uri_uses_path_only() {
    let f = fixture(DecoderConfig::default());

    let (outcome, _) = decode(&f.decoder, "http://www.example.com/news/2015/");
    assert!(matches!(outcome, DecodeOutcome::Resolved { resource_id: 11, .. }));
    assert_eq!(f.tree.lookups(), 2);
}
