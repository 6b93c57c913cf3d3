use phase2::{verify_transcript, MPCParameters, R1CS};
use setup_utils::{CheckForCorrectness, EntropyMixer, Groth16Params, UseCompression};
use test_helpers::{random_phase1, CubicCircuit, SquaringCircuit};

use ark_bls12_377::Bls12_377;
use ark_bls12_381::Bls12_381;
use ark_ec::pairing::Pairing;
use ark_groth16::Groth16;
use ark_relations::r1cs::ConstraintSynthesizer;
use ark_snark::SNARK;
use ark_std::UniformRand;
use rand::thread_rng;

// runs the ceremony over the phase 1 output, returning every intermediate file
fn run_ceremony<E: Pairing, C: ConstraintSynthesizer<E::ScalarField>>(
    circuit: C,
    phase1: &Groth16Params<E>,
    contributors: usize,
    beacon: &[u8],
) -> (R1CS<E::ScalarField>, Vec<MPCParameters<E>>) {
    let rng = &mut thread_rng();
    let r1cs = R1CS::from_synthesizer(circuit).unwrap();
    let mut mpc = MPCParameters::new(&r1cs, phase1).unwrap();
    let mut files = vec![mpc.clone()];

    for i in 0..contributors {
        let before = mpc.clone();
        if i % 2 == 0 {
            let delta = E::ScalarField::rand(rng);
            mpc.contribute(&delta, rng).unwrap();
        } else {
            let mut mixer = EntropyMixer::new();
            mixer.absorb(format!("contributor {}", i).as_bytes()).absorb_os_rng();
            mpc.contribute_with_entropy(&mixer.finalize().unwrap()).unwrap();
        }
        before.verify(&mpc).unwrap();

        // every contributor passes the file on through its encoding
        let mut buf = vec![];
        mpc.write(&mut buf, UseCompression::Yes).unwrap();
        mpc = MPCParameters::read(&buf, CheckForCorrectness::Full).unwrap();
        files.push(mpc.clone());
    }

    mpc.apply_beacon(beacon, 1 << 10).unwrap();
    files.push(mpc);
    (r1cs, files)
}

#[test]
fn three_contributors_and_a_beacon() {
    let rng = &mut thread_rng();
    let r1cs = R1CS::from_synthesizer(CubicCircuit::<<Bls12_381 as Pairing>::ScalarField>::default()).unwrap();
    let phase1 = random_phase1::<Bls12_381, _>(8, rng).unwrap();
    let mut mpc = MPCParameters::new(&r1cs, &phase1).unwrap();
    let mut files = vec![mpc.clone()];

    let mut published = vec![];
    for (name, entropy) in &[("alice", b"E1"), ("bob", b"E2"), ("charlie", b"E3")] {
        let mut mixer = EntropyMixer::new();
        mixer.absorb(&entropy[..]);
        let digest = mpc.contribute_with_entropy(&mixer.finalize().unwrap()).unwrap();
        assert_eq!(hex::encode(&digest[..]), mpc.digest_hex(), "{}", name);
        published.push(mpc.digest_hex());

        let mut buf = vec![];
        mpc.write(&mut buf, UseCompression::Yes).unwrap();
        mpc = MPCParameters::read(&buf, CheckForCorrectness::Full).unwrap();
        files.push(mpc.clone());
    }

    let seed = b"S";
    mpc.apply_beacon(seed, 1 << 10).unwrap();
    files.push(mpc);

    let report = verify_transcript(&files);
    assert!(report.valid, "{:?}", report.error);
    assert_eq!(report.files, 5);
    assert_eq!(report.contributions, 4);
    assert_eq!(report.history.len(), 4);
    for (i, record) in report.history.iter().enumerate() {
        assert_eq!(record.index, i);
        assert_eq!(record.previous_digest, files[i].digest_hex());
        assert_eq!(record.digest, files[i + 1].digest_hex());
    }
    let produced = report.history.iter().map(|r| r.digest.clone()).collect::<Vec<_>>();
    assert_eq!(produced[..3], published[..]);
    assert_eq!(report.digest.as_deref(), Some(produced[3].as_str()));

    files[0].verify_initialization(&r1cs, &phase1).unwrap();
    let last = &files[4];
    last.verify_beacon(seed, 1 << 10).unwrap();
    assert!(last.verify_beacon(seed, (1 << 10) - 1).is_err());

    // the same entropy reproduces Alice's file
    let mut replay = files[0].clone();
    let mut mixer = EntropyMixer::new();
    mixer.absorb(b"E1");
    replay.contribute_with_entropy(&mixer.finalize().unwrap()).unwrap();
    assert_eq!(replay.digest_hex(), files[1].digest_hex());
}

#[test]
fn ceremony_produces_working_groth16_keys() {
    let rng = &mut thread_rng();
    let num_squarings = 1000;
    let phase1 = random_phase1::<Bls12_381, _>(1 << 10, rng).unwrap();
    let (r1cs, files) = run_ceremony(
        SquaringCircuit::<<Bls12_381 as Pairing>::ScalarField>::new(None, num_squarings),
        &phase1,
        3,
        b"beacon",
    );
    assert_eq!(r1cs.shape().unwrap().domain_size, 1 << 10);
    assert_eq!(files.len(), 5);

    let report = verify_transcript(&files);
    assert!(report.valid, "{:?}", report.error);
    assert_eq!(report.contributions, 4);

    files[0].verify_initialization(&r1cs, &phase1).unwrap();
    let last = files.last().unwrap();
    last.verify_beacon(b"beacon", 1 << 10).unwrap();
    assert!(last.verify_beacon(b"another beacon", 1 << 10).is_err());

    let pk = last.proving_key();
    let x = <Bls12_381 as Pairing>::ScalarField::from(3u64);
    let circuit = SquaringCircuit::new(Some(x), num_squarings);
    let output = circuit.output().unwrap();
    let proof = Groth16::<Bls12_381>::prove(&pk, circuit, rng).unwrap();
    assert!(Groth16::<Bls12_381>::verify(&last.verifying_key(), &[output], &proof).unwrap());
    assert!(!Groth16::<Bls12_381>::verify(&last.verifying_key(), &[output + x], &proof).unwrap());
}

fn cubic_ceremony<E: Pairing>() {
    let rng = &mut thread_rng();
    let phase1 = random_phase1::<E, _>(8, rng).unwrap();
    let (_, files) = run_ceremony(CubicCircuit::<E::ScalarField>::default(), &phase1, 2, b"cubic");
    assert!(verify_transcript(&files).valid);

    let last = files.last().unwrap();
    let circuit = CubicCircuit::new(E::ScalarField::from(3u64));
    let y = circuit.output().unwrap();
    assert_eq!(y, E::ScalarField::from(35u64));

    let proof = Groth16::<E>::prove(&last.proving_key(), circuit, rng).unwrap();
    assert!(Groth16::<E>::verify(&last.verifying_key(), &[y], &proof).unwrap());
}

#[test]
fn cubic_ceremony_bls12_381() {
    cubic_ceremony::<Bls12_381>()
}

#[test]
fn cubic_ceremony_bls12_377() {
    cubic_ceremony::<Bls12_377>()
}

#[test]
fn keys_from_an_uncontributed_file_still_prove() {
    // gamma = delta = 1 is insecure but still a consistent key pair
    let rng = &mut thread_rng();
    let phase1 = random_phase1::<Bls12_381, _>(8, rng).unwrap();
    let r1cs = R1CS::from_synthesizer(CubicCircuit::<<Bls12_381 as Pairing>::ScalarField>::default()).unwrap();
    let mpc = MPCParameters::new(&r1cs, &phase1).unwrap();

    let circuit = CubicCircuit::new(<Bls12_381 as Pairing>::ScalarField::from(5u64));
    let y = circuit.output().unwrap();
    let proof = Groth16::<Bls12_381>::prove(&mpc.proving_key(), circuit, rng).unwrap();
    assert!(Groth16::<Bls12_381>::verify(&mpc.verifying_key(), &[y], &proof).unwrap());
}
