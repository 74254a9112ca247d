use {
    trezoa_account::Account, trezoa_instructions_sysvar::construct_instructions_data,
    trezoa_message::SanitizedMessage, trezoa_pubkey::Pubkey,
};

/// The instructions sysvar account for a message, as the runtime would serve
/// it to introspecting programs.
pub fn keyed_account(message: &SanitizedMessage) -> (Pubkey, Account) {
    let data = construct_instructions_data(&message.decompile_instructions());

    (
        trezoa_instructions_sysvar::ID,
        Account {
            lamports: 0,
            data,
            owner: trezoa_sysvar_id::ID,
            executable: false,
            rent_epoch: Default::default(),
        },
    )
}
