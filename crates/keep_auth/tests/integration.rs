use keep_auth::mem_store::{
    create_mem_account_store, create_mem_recovery_store, create_mem_session_issuer,
};
use keep_auth::{login, recovery, registration};
use keep_auth::{AccountStore, HashAlg, KeepError, WordHasher};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use word_bundle::MnemonicScheme;

fn init_tracing() {
    let _ = tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .finish(),
    );
}

fn answer(words: &[String], indices: &[usize]) -> Vec<String> {
    indices.iter().map(|&i| words[i].clone()).collect()
}

async fn register(
    username: &str,
    scheme: MnemonicScheme,
    store: &AccountStore,
    hasher: &WordHasher,
) -> Vec<String> {
    let generated = registration::begin(username, scheme, hasher.alg()).unwrap();
    let words = generated.reveal_mnemonic().to_vec();
    generated.submit(store, hasher).await.unwrap();
    words
}

#[tokio::test(flavor = "multi_thread")]
async fn register_login_recover_round_trip() {
    init_tracing();

    let accounts = create_mem_account_store();
    let recovery_store = create_mem_recovery_store();
    let issuer = create_mem_session_issuer();
    let hasher = WordHasher::new(HashAlg::Sha256);

    // register
    let words = register("alice", MnemonicScheme::Nine, &accounts, &hasher).await;
    assert_eq!(9, words.len());

    // an empty submission must not pass
    let challenge = login::begin("alice", &accounts).await.unwrap();
    assert!(challenge
        .verify(&[], &accounts, &issuer, &hasher)
        .await
        .is_err());

    // login with the registered mnemonic
    let challenge = login::begin("alice", &accounts).await.unwrap();
    let submitted = answer(&words, challenge.indices());
    let session = challenge
        .verify(&submitted, &accounts, &issuer, &hasher)
        .await
        .unwrap();
    assert_eq!("alice", &*session.account.identifier);

    // the mnemonic is lost; guardians re-key the account
    let guardians: HashSet<_> = ["g1", "g2", "g3"].into_iter().map(Into::into).collect();
    let initiated = recovery::initiate(
        "alice",
        guardians,
        2,
        3600,
        MnemonicScheme::Nine,
        &hasher,
        &recovery_store,
    )
    .await
    .unwrap();
    let new_words = initiated.reveal_mnemonic().to_vec();

    recovery::approve(initiated.request_id(), "g1".into(), &recovery_store)
        .await
        .unwrap();
    recovery::approve(initiated.request_id(), "g3".into(), &recovery_store)
        .await
        .unwrap();
    recovery::finalize(initiated.request_id(), &recovery_store, &accounts)
        .await
        .unwrap();

    // the old mnemonic no longer logs in...
    let challenge = login::begin("alice", &accounts).await.unwrap();
    let stale = answer(&words, challenge.indices());
    assert!(matches!(
        challenge.verify(&stale, &accounts, &issuer, &hasher).await,
        Err(KeepError::ChallengeMismatch)
    ));

    // ...and the replacement one does
    let challenge = login::begin("alice", &accounts).await.unwrap();
    let fresh = answer(&new_words, challenge.indices());
    challenge
        .verify(&fresh, &accounts, &issuer, &hasher)
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn twelve_word_accounts_log_in_transparently() {
    let accounts = create_mem_account_store();
    let issuer = create_mem_session_issuer();
    let hasher = WordHasher::new(HashAlg::Sha256);

    let words = register("legacy", MnemonicScheme::Twelve, &accounts, &hasher).await;
    assert_eq!(12, words.len());

    let challenge = login::begin("legacy", &accounts).await.unwrap();
    assert!(challenge.indices().iter().all(|&i| i < 12));
    let submitted = answer(&words, challenge.indices());
    challenge
        .verify(&submitted, &accounts, &issuer, &hasher)
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn keccak_configured_deployment_works_end_to_end() {
    let accounts = create_mem_account_store();
    let issuer = create_mem_session_issuer();
    let hasher = WordHasher::new(HashAlg::Keccak256);

    let words = register("kecc", MnemonicScheme::Nine, &accounts, &hasher).await;
    let challenge = login::begin("kecc", &accounts).await.unwrap();
    let submitted = answer(&words, challenge.indices());
    challenge
        .verify(&submitted, &accounts, &issuer, &hasher)
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_finalize_applies_exactly_once() {
    let accounts = create_mem_account_store();
    let recovery_store = create_mem_recovery_store();
    let hasher = WordHasher::new(HashAlg::Sha256);

    register("alice", MnemonicScheme::Nine, &accounts, &hasher).await;

    let guardians: HashSet<_> = ["g1", "g2"].into_iter().map(Into::into).collect();
    let initiated = recovery::initiate(
        "alice",
        guardians,
        2,
        3600,
        MnemonicScheme::Nine,
        &hasher,
        &recovery_store,
    )
    .await
    .unwrap();

    recovery::approve(initiated.request_id(), "g1".into(), &recovery_store)
        .await
        .unwrap();
    recovery::approve(initiated.request_id(), "g2".into(), &recovery_store)
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let id = initiated.request_id();
        let recovery_store = recovery_store.clone();
        let accounts = accounts.clone();
        tasks.push(tokio::spawn(async move {
            recovery::finalize(id, &recovery_store, &accounts).await
        }));
    }

    let mut wins = 0;
    let mut already = 0;
    for t in tasks {
        match t.await.unwrap() {
            Ok(()) => wins += 1,
            Err(KeepError::AlreadyFinalized) | Err(KeepError::RequestNotFound) => {
                already += 1
            }
            Err(e) => panic!("unexpected finalize error: {e}"),
        }
    }
    assert_eq!(1, wins, "exactly one finalize may apply");
    assert_eq!(7, already);

    // the applied credentials are the pending ones
    assert_eq!(
        *initiated.salt(),
        accounts.get_salt("alice".into()).await.unwrap()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn stored_records_round_trip_as_plain_wire_values() {
    let accounts = create_mem_account_store();
    let hasher = WordHasher::new(HashAlg::Sha256);
    register("alice", MnemonicScheme::Nine, &accounts, &hasher).await;

    let record = accounts.get_account("alice".into()).await.unwrap();
    let json = serde_json::to_string_pretty(&record).unwrap();

    // digests and keys travel as fixed-width hex strings
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(64, parsed["address"].as_str().unwrap().len());
    assert_eq!(64, parsed["publicKey"].as_str().unwrap().len());
    let hashes = parsed["wordHashes"].as_array().unwrap();
    assert_eq!(9, hashes.len());
    for h in hashes {
        let h = h.as_str().unwrap();
        assert_eq!(64, h.len());
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    let back: keep_auth::AccountRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record, back);
}
