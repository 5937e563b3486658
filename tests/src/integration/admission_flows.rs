//! # Admission Flow Tests
//!
//! Drives a fully wired qc-18 pipeline through `AdmissionApi` against the
//! in-memory capability providers.
//!
//! ## Flows Tested:
//!
//! 1. **Scenarios A-D**: valid send, stale sequence, oversized simulation,
//!    redundant relay
//! 2. **Ordering**: fee deduction fires before signature verification
//! 3. **Key types**: ed25519 signers and 2-of-3 secp256k1 multisig
//! 4. **Sign modes**: legacy amino JSON alongside direct
//! 5. **Fee grants**: granter pays, allowance shrinks
//! 6. **Parallel checking**: independent transactions on many threads

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use qc_18_tx_admission::domain::signing::test_helpers::{Ed25519Signer, Secp256k1Signer};
    use qc_18_tx_admission::stages::test_helpers::{
        check_ctx, deliver_ctx, send_msg, sign_tx, signed_send, unsigned_tx, TestChain, CHAIN_ID,
        DENOM,
    };
    use qc_18_tx_admission::{
        AccountLedger, Admission, AdmissionApi, AnteHandler, AuthParams, ErrorKind,
        SignModeHandler, SignatureData, SignerData, StageId, CANONICAL_ORDER,
    };
    use shared_types::{
        Coins, ModeInfo, Msg, MsgRecvPacket, Packet, PublicKey, RelayAction, SignMode,
        Transaction,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn pipeline(chain: &TestChain) -> AnteHandler {
        init_tracing();
        chain.options().build().expect("all capabilities wired")
    }

    fn sequence_of(chain: &TestChain, address: &[u8; 20]) -> u64 {
        chain
            .accounts
            .account(address)
            .unwrap()
            .expect("account exists")
            .sequence
    }

    fn sign_bytes(chain: &TestChain, tx: &Transaction, pub_key: &PublicKey, mode: SignMode) -> Vec<u8> {
        let address = pub_key.address();
        let account_number = chain
            .accounts
            .account(&address)
            .unwrap()
            .expect("account exists")
            .account_number;
        let data = SignerData {
            address,
            chain_id: CHAIN_ID.into(),
            account_number,
            sequence: tx.auth_info.signer_infos[0].sequence,
            pub_key: pub_key.clone(),
        };
        chain.sign_mode.get_sign_bytes(mode, &data, tx).unwrap()
    }

    fn relay_packet(sequence: u64) -> Packet {
        Packet {
            sequence,
            source_port: "transfer".into(),
            source_channel: "channel-0".into(),
            destination_port: "transfer".into(),
            destination_channel: "channel-4".into(),
            data: br#"{"amount":"10"}"#.to_vec(),
            timeout_height: 1_000,
            timeout_timestamp: 0,
        }
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[test]
    fn test_scenario_a_valid_send_advances_sequence() {
        let chain = TestChain::new();
        let signer = Secp256k1Signer::generate();
        let address = chain.fund(&signer, 5, 1_000_000);
        let handler = pipeline(&chain);

        let tx = signed_send(&chain, &signer, 5, 5_000, 150_000);
        let mut ctx = deliver_ctx(42);
        assert_eq!(handler.deliver_tx(&mut ctx, &tx), Ok(Admission::Accepted));

        assert_eq!(sequence_of(&chain, &address), 6);
        assert_eq!(chain.bank.balance(&address, DENOM), 995_000);
        let collector = chain.accounts.module_address(&chain.config.fee_collector);
        assert_eq!(chain.bank.balance(&collector, DENOM), 5_000);

        // the key is stored on first use
        let account = chain.accounts.account(&address).unwrap().unwrap();
        assert_eq!(account.pub_key, Some(signer.public_key.clone()));
    }

    #[test]
    fn test_scenario_b_stale_sequence_rejected() {
        let chain = TestChain::new();
        let signer = Secp256k1Signer::generate();
        let address = chain.fund(&signer, 5, 1_000_000);
        let handler = pipeline(&chain);

        let tx = signed_send(&chain, &signer, 7, 5_000, 150_000);
        let err = handler.deliver_tx(&mut deliver_ctx(42), &tx).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SequenceMismatch);
        assert_eq!(err.stage, StageId::SigVerification);
        assert_eq!(sequence_of(&chain, &address), 5);
        assert!(err.kind().is_caller_fixable());
    }

    #[test]
    fn test_scenario_c_simulation_over_ceiling() {
        let chain = TestChain::new();
        let signer = Secp256k1Signer::generate();
        let handler = pipeline(&chain);

        // the signer has no account: any ledger read would fail with another kind
        let tx = unsigned_tx(
            vec![send_msg(signer.public_key.address(), 1)],
            &signer.public_key,
            0,
            0,
            10_000_000,
        );
        let err = handler.simulate_tx(&mut check_ctx(42), &tx).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::GasCeilingExceeded);
        assert_eq!(err.stage, StageId::LimitSimulationGas);
    }

    #[test]
    fn test_scenario_d_redundant_relay_short_circuits() {
        let chain = TestChain::new();
        let relayer = Secp256k1Signer::generate();
        let address = chain.fund(&relayer, 0, 1_000_000);
        let handler = pipeline(&chain);

        let packet = relay_packet(9);
        chain
            .relay
            .mark_processed(RelayAction::Receive, packet.destination_id());

        let mut tx = unsigned_tx(
            vec![Msg::RecvPacket(MsgRecvPacket {
                packet: packet.clone(),
                proof_commitment: vec![0xAB],
                proof_height: 40,
                signer: address,
            })],
            &relayer.public_key,
            0,
            1_000,
            200_000,
        );
        sign_tx(&chain, &mut tx, 0, &relayer);

        let admission = handler.check_tx(&mut check_ctx(42), &tx).unwrap();
        assert!(admission.is_redundant_relay());
        assert_eq!(
            admission,
            Admission::RedundantRelay {
                packets: vec![packet.destination_id()]
            }
        );

        // a fresh packet is admitted normally
        let mut fresh = unsigned_tx(
            vec![Msg::RecvPacket(MsgRecvPacket {
                packet: relay_packet(10),
                proof_commitment: vec![0xAB],
                proof_height: 40,
                signer: address,
            })],
            &relayer.public_key,
            1,
            1_000,
            200_000,
        );
        sign_tx(&chain, &mut fresh, 0, &relayer);
        assert_eq!(
            handler.check_tx(&mut check_ctx(42), &fresh),
            Ok(Admission::Accepted)
        );
    }

    // =============================================================================
    // ORDERING
    // =============================================================================

    #[test]
    fn test_canonical_order_is_exposed() {
        let chain = TestChain::new();
        let handler = pipeline(&chain);
        assert_eq!(handler.stage_order(), CANONICAL_ORDER.to_vec());
        assert_eq!(handler.stage_order()[8], StageId::DeductFee);
        assert_eq!(handler.stage_order()[12], StageId::SigVerification);
    }

    #[test]
    fn test_fee_checked_before_signature() {
        let chain = TestChain::new();
        let signer = Secp256k1Signer::generate();
        chain.fund(&signer, 0, 100);

        let mut tx = signed_send(&chain, &signer, 0, 5_000, 150_000);
        tx.signatures[0] = signer.sign(b"not the sign document");

        let canonical = pipeline(&chain);
        let err = canonical.deliver_tx(&mut deliver_ctx(42), &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

        let mut order = CANONICAL_ORDER.to_vec();
        order.swap(8, 12);
        let swapped = chain.options().build_with_order(&order).unwrap();
        let err = swapped.deliver_tx(&mut deliver_ctx(42), &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    }

    // =============================================================================
    // KEY TYPES AND SIGN MODES
    // =============================================================================

    #[test]
    fn test_ed25519_signer() {
        let chain = TestChain::new();
        let signer = Ed25519Signer::generate();
        let address = signer.public_key.address();
        chain.accounts.create_account(address);
        chain.bank.set_balance(address, DENOM, 50_000);
        let handler = pipeline(&chain);

        let mut tx = unsigned_tx(vec![send_msg(address, 1)], &signer.public_key, 0, 1_000, 100_000);
        let bytes = sign_bytes(&chain, &tx, &signer.public_key, SignMode::Direct);
        tx.signatures[0] = signer.sign(&bytes);

        let mut ctx = deliver_ctx(7);
        assert_eq!(handler.deliver_tx(&mut ctx, &tx), Ok(Admission::Accepted));
        assert_eq!(sequence_of(&chain, &address), 1);
    }

    #[test]
    fn test_legacy_amino_json_signer() {
        let chain = TestChain::new();
        let signer = Secp256k1Signer::generate();
        let address = chain.fund(&signer, 3, 50_000);
        let handler = pipeline(&chain);

        let mut tx = unsigned_tx(vec![send_msg(address, 1)], &signer.public_key, 3, 1_000, 100_000);
        tx.body.memo = "amino".into();
        tx.auth_info.signer_infos[0].mode_info = ModeInfo::Single {
            mode: SignMode::LegacyAminoJson,
        };
        let bytes = sign_bytes(&chain, &tx, &signer.public_key, SignMode::LegacyAminoJson);
        tx.signatures[0] = signer.sign(&bytes);

        assert_eq!(
            handler.deliver_tx(&mut deliver_ctx(7), &tx),
            Ok(Admission::Accepted)
        );
        assert_eq!(sequence_of(&chain, &address), 4);
    }

    fn multisig_tx(
        chain: &TestChain,
        members: &[Secp256k1Signer],
        signing: &[usize],
    ) -> (PublicKey, Transaction) {
        let multisig = PublicKey::Multisig {
            threshold: 2,
            keys: members.iter().map(|m| m.public_key.clone()).collect(),
        };
        let address = multisig.address();
        chain.accounts.create_account(address);
        chain.bank.set_balance(address, DENOM, 100_000);

        let mut tx = unsigned_tx(vec![send_msg(address, 1)], &multisig, 0, 2_000, 200_000);
        tx.auth_info.signer_infos[0].mode_info = ModeInfo::Multi {
            bitarray: (0..members.len()).map(|i| signing.contains(&i)).collect(),
            mode_infos: signing
                .iter()
                .map(|_| ModeInfo::Single {
                    mode: SignMode::Direct,
                })
                .collect(),
        };
        let bytes = sign_bytes(chain, &tx, &multisig, SignMode::Direct);
        let parts: Vec<Vec<u8>> = signing.iter().map(|i| members[*i].sign(&bytes)).collect();
        tx.signatures[0] = SignatureData::encode_multi(&parts).unwrap();
        (multisig, tx)
    }

    #[test]
    fn test_two_of_three_multisig() {
        let chain = TestChain::new();
        let members: Vec<_> = (0..3).map(|_| Secp256k1Signer::generate()).collect();
        let handler = pipeline(&chain);

        let (multisig, tx) = multisig_tx(&chain, &members, &[0, 2]);
        let mut ctx = deliver_ctx(7);
        assert_eq!(handler.deliver_tx(&mut ctx, &tx), Ok(Admission::Accepted));
        assert_eq!(sequence_of(&chain, &multisig.address()), 1);
        // two secp256k1 verifications are pre-paid
        assert!(ctx.gas_meter.consumed() >= 2 * AuthParams::default().sig_verify_cost_secp256k1);
    }

    #[test]
    fn test_multisig_below_threshold() {
        let chain = TestChain::new();
        let members: Vec<_> = (0..3).map(|_| Secp256k1Signer::generate()).collect();
        let handler = pipeline(&chain);

        let (multisig, tx) = multisig_tx(&chain, &members, &[1]);
        let err = handler.deliver_tx(&mut deliver_ctx(7), &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
        assert_eq!(sequence_of(&chain, &multisig.address()), 0);
    }

    // =============================================================================
    // FEES
    // =============================================================================

    #[test]
    fn test_fee_grant_pays_for_grantee() {
        let chain = TestChain::new();
        let grantee = Secp256k1Signer::generate();
        let granter = Secp256k1Signer::generate();
        let grantee_addr = chain.fund(&grantee, 0, 0);
        let granter_addr = chain.fund(&granter, 0, 100_000);
        chain.fee_grants.grant(
            granter_addr,
            grantee_addr,
            Coins::single(DENOM, 10_000).unwrap(),
        );
        let handler = pipeline(&chain);

        let mut tx = unsigned_tx(vec![send_msg(grantee_addr, 1)], &grantee.public_key, 0, 4_000, 100_000);
        tx.auth_info.fee.granter = Some(granter_addr);
        sign_tx(&chain, &mut tx, 0, &grantee);

        assert_eq!(
            handler.deliver_tx(&mut deliver_ctx(7), &tx),
            Ok(Admission::Accepted)
        );
        assert_eq!(chain.bank.balance(&granter_addr, DENOM), 96_000);
        assert_eq!(chain.bank.balance(&grantee_addr, DENOM), 0);
        assert_eq!(
            chain.fee_grants.remaining(&granter_addr, &grantee_addr),
            Some(Coins::single(DENOM, 6_000).unwrap())
        );
    }

    #[test]
    fn test_fee_grant_exceeded() {
        let chain = TestChain::new();
        let grantee = Secp256k1Signer::generate();
        let granter = Secp256k1Signer::generate();
        let grantee_addr = chain.fund(&grantee, 0, 0);
        let granter_addr = chain.fund(&granter, 0, 100_000);
        chain.fee_grants.grant(
            granter_addr,
            grantee_addr,
            Coins::single(DENOM, 1_000).unwrap(),
        );
        let handler = pipeline(&chain);

        let mut tx = unsigned_tx(vec![send_msg(grantee_addr, 1)], &grantee.public_key, 0, 4_000, 100_000);
        tx.auth_info.fee.granter = Some(granter_addr);
        sign_tx(&chain, &mut tx, 0, &grantee);

        let err = handler.deliver_tx(&mut deliver_ctx(7), &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FeeGrantDenied);
        assert_eq!(chain.bank.balance(&granter_addr, DENOM), 100_000);
    }

    #[test]
    fn test_memo_limit_from_params() {
        let chain = TestChain::new();
        chain.accounts.set_params(AuthParams {
            max_memo_characters: 4,
            ..AuthParams::default()
        });
        let signer = Secp256k1Signer::generate();
        let address = chain.fund(&signer, 0, 50_000);
        let handler = pipeline(&chain);

        let mut tx = unsigned_tx(vec![send_msg(address, 1)], &signer.public_key, 0, 1_000, 100_000);
        tx.body.memo = "too long".into();
        sign_tx(&chain, &mut tx, 0, &signer);

        let err = handler.deliver_tx(&mut deliver_ctx(7), &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MemoTooLong);
        assert_eq!(err.stage, StageId::ValidateMemo);
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[test]
    fn test_parallel_check_of_independent_transactions() {
        let chain = TestChain::new();
        let handler = Arc::new(pipeline(&chain));
        let signers: Vec<_> = (0..8).map(|_| Secp256k1Signer::generate()).collect();
        let txs: Vec<_> = signers
            .iter()
            .map(|s| {
                chain.fund(s, 0, 10_000);
                signed_send(&chain, s, 0, 1_000, 100_000)
            })
            .collect();

        std::thread::scope(|scope| {
            for tx in &txs {
                let handler = Arc::clone(&handler);
                scope.spawn(move || {
                    let mut ctx = check_ctx(42);
                    assert_eq!(handler.check_tx(&mut ctx, tx), Ok(Admission::Accepted));
                });
            }
        });

        assert_eq!(chain.tx_counter.count(), 8);
        for signer in &signers {
            assert_eq!(sequence_of(&chain, &signer.public_key.address()), 1);
        }
    }
}
