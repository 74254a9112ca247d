//! Sysvars served to programs, both through the sysvar cache and as accounts.

use {
    trezoa_account::Account,
    trezoa_clock::Clock,
    trezoa_epoch_schedule::EpochSchedule,
    trezoa_program_runtime::sysvar_cache::SysvarCache,
    trezoa_pubkey::Pubkey,
    trezoa_rent::Rent,
    trezoa_sdk_ids::sysvar,
};

/// Sysvars served by the local engine.
pub struct Sysvars {
    pub clock: Clock,
    pub epoch_schedule: EpochSchedule,
    pub rent: Rent,
}

impl Default for Sysvars {
    fn default() -> Self {
        Self {
            clock: Clock::default(),
            epoch_schedule: EpochSchedule::default(),
            rent: Rent::default(),
        }
    }
}

fn sysvar_account<T: serde::Serialize>(sysvar: &T, rent: &Rent) -> Option<Account> {
    let data = bincode::serialize(sysvar).ok()?;
    Some(Account {
        lamports: rent.minimum_balance(data.len()).max(1),
        data,
        owner: trezoa_sysvar_id::ID,
        executable: false,
        rent_epoch: 0,
    })
}

impl Sysvars {
    /// Create the account for `pubkey` if it names a sysvar this engine
    /// serves.
    pub fn maybe_create_sysvar_account(&self, pubkey: &Pubkey) -> Option<Account> {
        if pubkey == &sysvar::clock::ID {
            sysvar_account(&self.clock, &self.rent)
        } else if pubkey == &sysvar::epoch_schedule::ID {
            sysvar_account(&self.epoch_schedule, &self.rent)
        } else if pubkey == &sysvar::rent::ID {
            sysvar_account(&self.rent, &self.rent)
        } else {
            None
        }
    }

    /// Build the cache the invoke context reads sysvars from.
    pub fn setup_sysvar_cache(&self) -> SysvarCache {
        let mut sysvar_cache = SysvarCache::default();
        sysvar_cache.fill_missing_entries(|pubkey, set_sysvar| {
            if let Some(account) = self.maybe_create_sysvar_account(pubkey) {
                set_sysvar(&account.data);
            }
        });
        sysvar_cache
    }

    /// Move the clock to `slot`, keeping the epoch consistent with the
    /// schedule.
    pub fn warp_to_slot(&mut self, slot: u64) {
        self.clock.slot = slot;
        self.clock.epoch = self.epoch_schedule.get_epoch(slot);
    }
}
