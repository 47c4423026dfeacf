//! Definitions of the Solidity interfaces the scripts call

#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use alloy::sol;

sol! {
    /// The OpenZeppelin governor deployed alongside the token
    #[sol(rpc)]
    interface IGovernor {
        event ProposalCreated(
            uint256 proposalId,
            address proposer,
            address[] targets,
            uint256[] values,
            string[] signatures,
            bytes[] calldatas,
            uint256 voteStart,
            uint256 voteEnd,
            string description
        );
        event VoteCast(address indexed voter, uint256 proposalId, uint8 support, uint256 weight, string reason);
        event ProposalExecuted(uint256 proposalId);

        function token() external view returns (address);
        function votingDelay() external view returns (uint256);
        function votingPeriod() external view returns (uint256);
        function state(uint256 proposalId) external view returns (uint8);
        function hashProposal(
            address[] targets,
            uint256[] values,
            bytes[] calldatas,
            bytes32 descriptionHash
        ) external pure returns (uint256);
        function propose(
            address[] targets,
            uint256[] values,
            bytes[] calldatas,
            string description
        ) external returns (uint256);
        function castVote(uint256 proposalId, uint8 support) external returns (uint256);
        function execute(
            address[] targets,
            uint256[] values,
            bytes[] calldatas,
            bytes32 descriptionHash
        ) external payable returns (uint256);
    }

    /// The ERC20 votes token minted through governance
    #[sol(rpc)]
    interface IVotesToken {
        function owner() external view returns (address);
        function delegate(address delegatee) external;
        function mint(address to, uint256 amount) external;
        function balanceOf(address account) external view returns (uint256);
        function getVotes(address account) external view returns (uint256);
    }

    /// The role-gated crowdfunding campaign
    #[sol(rpc)]
    interface ICrowdfunding {
        event RoleGranted(bytes32 indexed role, address indexed account, address indexed sender);
        event RoleRevoked(bytes32 indexed role, address indexed account, address indexed sender);
        event FundsContributed(address indexed backer, uint256 amount);

        function BACKER() external view returns (bytes32);
        function DEFAULT_ADMIN_ROLE() external view returns (bytes32);
        function hasRole(bytes32 role, address account) external view returns (bool);
        function addBacker(address backer) external;
        function removeBacker(address backer) external;
        function setCampaignOwner(address owner) external;
        function _campaignOwner() external view returns (address);
        function contribute() external payable;
        function withdraw() external;
    }
}
