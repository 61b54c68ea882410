use password_chain::{
    Argon2Hasher, BcryptHasher, BcryptParams, HashAlgorithm, PasswordChain, VerifyOutcome,
};

fn main() {
    // You have an old bcrypt hash because you, for example, migrated from an old Rails application
    let mut stored_hash =
        String::from("$2b$04$EGdrhbKUv8Oc9vGiXX0HQOxSg445d458Muh7DAHskb6QbtCvdxcie");

    // Argon2 is used for everything new, bcrypt stays around to verify what's already stored
    let legacy = BcryptHasher::new(BcryptParams {
        rounds: 4,
        ..BcryptParams::default()
    })
    .unwrap();
    let chain = PasswordChain::new(Argon2Hasher::default(), [legacy.into()]);

    println!("Stored hash: {stored_hash}");

    // On login, the hash gets replaced as soon as the password is known to be correct
    match chain
        .verify_and_update(b"correctbatteryhorsestapler", &stored_hash)
        .unwrap()
    {
        VerifyOutcome::Verified { upgraded } => {
            println!("Verification successful!");
            if let Some(upgraded) = upgraded {
                stored_hash = upgraded;
            }
        }
        VerifyOutcome::Rejected => {
            println!("Wrong password, hash unchanged");
            return;
        }
    }

    println!("Upgraded hash: {stored_hash}");
    assert!(chain.current().identify(&stored_hash));

    // Next login finds nothing left to do
    let outcome = chain
        .verify_and_update(b"correctbatteryhorsestapler", &stored_hash)
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Verified { upgraded: None });
}
