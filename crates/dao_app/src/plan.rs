use dao_chain::{DeploymentPlan, DeploymentSpec, PlanError, U256};

pub const NFT: &str = "CryptoDevsNFT";
pub const MARKETPLACE: &str = "FakeMarketplace";
pub const DAO: &str = "CryptoDevsDAO";

/// The CryptoDevs deployment: the NFT and the marketplace, then the DAO,
/// which is funded with `dao_funding` and wired to both.
pub fn cryptodevs_plan(dao_funding: U256) -> Result<DeploymentPlan, PlanError> {
    DeploymentPlan::new(vec![
        DeploymentSpec::new(NFT),
        DeploymentSpec::new(MARKETPLACE),
        DeploymentSpec::new(DAO)
            .address_of(MARKETPLACE)
            .address_of(NFT)
            .value(dao_funding),
    ])
}
