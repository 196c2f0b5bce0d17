//! Sharing one service across threads.

use std::thread;

use eidas_integration_tests::TestEnv;
use eidas_saml::ErrorKind;

#[test]
fn test_parallel_verification_with_shared_service() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let good = (0..6)
        .map(|_| env.response().build(&env.keys))
        .collect::<Result<Vec<_>, _>>()?;
    let bad = env.response().with_assertion_count(2).build(&env.keys)?;

    let env = &env;
    thread::scope(|scope| {
        let handles: Vec<_> = good
            .iter()
            .map(|encoded| scope.spawn(move || env.verify(encoded)))
            .collect();
        let rejected = scope.spawn(|| env.verify(&bad));

        for handle in handles {
            let result = handle.join().expect("worker panicked").expect("verified");
            assert_eq!(result.attributes()["FamilyName"], "Garcia");
        }
        let err = rejected.join().expect("worker panicked").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousAssertion);
    });
    Ok(())
}
