// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract KuruRouter {
        function anyToAnySwap(
            address[] calldata _marketAddresses,
            bool[] calldata _isBuy,
            bool[] calldata _nativeSend,
            address _debitToken,
            address _creditToken,
            uint256 _amount,
            uint256 _minAmountOut
        ) external payable returns (uint256 _amountOut);
    }

    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract KuruUtils {
        function calculatePriceOverRoute(address[] calldata route, bool[] calldata isBuy) external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract Erc20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
    }
}
