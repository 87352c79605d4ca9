use core::ffi::CStr;

// Actions
pub const kOfxActionLoad: &CStr = cstr!("OfxActionLoad");
pub const kOfxActionUnload: &CStr = cstr!("OfxActionUnload");
pub const kOfxActionDescribe: &CStr = cstr!("OfxActionDescribe");
pub const kOfxActionCreateInstance: &CStr = cstr!("OfxActionCreateInstance");
pub const kOfxActionDestroyInstance: &CStr = cstr!("OfxActionDestroyInstance");
pub const kOfxMeshEffectActionCook: &CStr = cstr!("OfxMeshEffectActionCook");
pub const kOfxMeshEffectActionIsIdentity: &CStr = cstr!("OfxMeshEffectActionIsIdentity");
/// Reserved, never dispatched by this host.
pub const kOfxMeshEffectActionDescribeInContext: &CStr =
    cstr!("OfxMeshEffectActionDescribeInContext");

// Suites
pub const kOfxPropertySuite: &CStr = cstr!("OfxPropertySuite");
pub const kOfxParameterSuite: &CStr = cstr!("OfxParameterSuite");
pub const kOfxMessageSuite: &CStr = cstr!("OfxMessageSuite");
pub const kOfxMeshEffectSuite: &CStr = cstr!("OfxMeshEffectSuite");

// Inputs
pub const kOfxMeshMainInput: &CStr = cstr!("OfxMeshMainInput");
pub const kOfxMeshMainOutput: &CStr = cstr!("OfxMeshMainOutput");

// Attachments
pub const kOfxMeshAttribPoint: &CStr = cstr!("OfxMeshAttribPoint");
pub const kOfxMeshAttribCorner: &CStr = cstr!("OfxMeshAttribCorner");
pub const kOfxMeshAttribFace: &CStr = cstr!("OfxMeshAttribFace");
pub const kOfxMeshAttribMesh: &CStr = cstr!("OfxMeshAttribMesh");

// Default attributes
pub const kOfxMeshAttribPointPosition: &CStr = cstr!("OfxMeshAttribPointPosition");
pub const kOfxMeshAttribCornerPoint: &CStr = cstr!("OfxMeshAttribCornerPoint");
pub const kOfxMeshAttribFaceSize: &CStr = cstr!("OfxMeshAttribFaceSize");

// Attribute component types
pub const kOfxMeshAttribTypeUByte: &CStr = cstr!("OfxMeshAttribTypeUByte");
pub const kOfxMeshAttribTypeInt: &CStr = cstr!("OfxMeshAttribTypeInt");
pub const kOfxMeshAttribTypeFloat: &CStr = cstr!("OfxMeshAttribTypeFloat");

// Attribute semantics
pub const kOfxMeshAttribSemanticTextureCoordinate: &CStr =
    cstr!("OfxMeshAttribSemanticTextureCoordinate");
pub const kOfxMeshAttribSemanticNormal: &CStr = cstr!("OfxMeshAttribSemanticNormal");
pub const kOfxMeshAttribSemanticColor: &CStr = cstr!("OfxMeshAttribSemanticColor");
pub const kOfxMeshAttribSemanticWeight: &CStr = cstr!("OfxMeshAttribSemanticWeight");

// Mesh properties
pub const kOfxMeshPropPointCount: &CStr = cstr!("OfxMeshPropPointCount");
pub const kOfxMeshPropCornerCount: &CStr = cstr!("OfxMeshPropCornerCount");
pub const kOfxMeshPropFaceCount: &CStr = cstr!("OfxMeshPropFaceCount");
pub const kOfxMeshPropNoLooseEdge: &CStr = cstr!("OfxMeshPropNoLooseEdge");
pub const kOfxMeshPropConstantFaceSize: &CStr = cstr!("OfxMeshPropConstantFaceSize");
pub const kOfxMeshPropAttributeCount: &CStr = cstr!("OfxMeshPropAttributeCount");
pub const kOfxMeshPropTransformMatrix: &CStr = cstr!("OfxMeshPropTransformMatrix");
pub const kOfxMeshPropInternalData: &CStr = cstr!("OfxMeshPropInternalData");
pub const kOfxMeshPropHostHandle: &CStr = cstr!("OfxMeshPropHostHandle");

// Attribute properties
pub const kOfxMeshAttribPropData: &CStr = cstr!("OfxMeshAttribPropData");
pub const kOfxMeshAttribPropStride: &CStr = cstr!("OfxMeshAttribPropStride");
pub const kOfxMeshAttribPropComponentCount: &CStr = cstr!("OfxMeshAttribPropComponentCount");
pub const kOfxMeshAttribPropType: &CStr = cstr!("OfxMeshAttribPropType");
pub const kOfxMeshAttribPropSemantic: &CStr = cstr!("OfxMeshAttribPropSemantic");
pub const kOfxMeshAttribPropIsOwner: &CStr = cstr!("OfxMeshAttribPropIsOwner");
pub const kMeshAttribRequestPropMandatory: &CStr = cstr!("MeshAttribRequestPropMandatory");

// Input properties
pub const kOfxInputPropRequestGeometry: &CStr = cstr!("OfxInputPropRequestGeometry");
pub const kOfxInputPropRequestTransform: &CStr = cstr!("OfxInputPropRequestTransform");

// Host properties
pub const kOfxHostPropBeforeMeshGetCb: &CStr = cstr!("OfxHostPropBeforeMeshGetCb");
pub const kOfxHostPropBeforeMeshReleaseCb: &CStr = cstr!("OfxHostPropBeforeMeshReleaseCb");
pub const kOfxHostPropBeforeMeshAllocateCb: &CStr = cstr!("OfxHostPropBeforeMeshAllocateCb");

// General properties
pub const kOfxPropLabel: &CStr = cstr!("OfxPropLabel");
pub const kOfxPropName: &CStr = cstr!("OfxPropName");
pub const kOfxPropTime: &CStr = cstr!("OfxPropTime");
pub const kOfxMeshEffectPropContext: &CStr = cstr!("OfxMeshEffectPropContext");
pub const kOfxMeshEffectContextFilter: &CStr = cstr!("OfxMeshEffectContextFilter");

// Parameter properties
pub const kOfxParamPropType: &CStr = cstr!("OfxParamPropType");
pub const kOfxParamPropScriptName: &CStr = cstr!("OfxParamPropScriptName");
pub const kOfxParamPropDefault: &CStr = cstr!("OfxParamPropDefault");
pub const kOfxParamPropMin: &CStr = cstr!("OfxParamPropMin");
pub const kOfxParamPropMax: &CStr = cstr!("OfxParamPropMax");
pub const kOfxParamPropDisplayMin: &CStr = cstr!("OfxParamPropDisplayMin");
pub const kOfxParamPropDisplayMax: &CStr = cstr!("OfxParamPropDisplayMax");

// Parameter types
pub const kOfxParamTypeInteger: &CStr = cstr!("OfxParamTypeInteger");
pub const kOfxParamTypeDouble: &CStr = cstr!("OfxParamTypeDouble");
pub const kOfxParamTypeBoolean: &CStr = cstr!("OfxParamTypeBoolean");
pub const kOfxParamTypeChoice: &CStr = cstr!("OfxParamTypeChoice");
pub const kOfxParamTypeRGBA: &CStr = cstr!("OfxParamTypeRGBA");
pub const kOfxParamTypeRGB: &CStr = cstr!("OfxParamTypeRGB");
pub const kOfxParamTypeDouble2D: &CStr = cstr!("OfxParamTypeDouble2D");
pub const kOfxParamTypeInteger2D: &CStr = cstr!("OfxParamTypeInteger2D");
pub const kOfxParamTypeDouble3D: &CStr = cstr!("OfxParamTypeDouble3D");
pub const kOfxParamTypeInteger3D: &CStr = cstr!("OfxParamTypeInteger3D");
pub const kOfxParamTypeString: &CStr = cstr!("OfxParamTypeString");
pub const kOfxParamTypeCustom: &CStr = cstr!("OfxParamTypeCustom");
pub const kOfxParamTypeGroup: &CStr = cstr!("OfxParamTypeGroup");
pub const kOfxParamTypePage: &CStr = cstr!("OfxParamTypePage");
pub const kOfxParamTypePushButton: &CStr = cstr!("OfxParamTypePushButton");

// Message types
pub const kOfxMessageFatal: &CStr = cstr!("OfxMessageFatal");
pub const kOfxMessageError: &CStr = cstr!("OfxMessageError");
pub const kOfxMessageWarning: &CStr = cstr!("OfxMessageWarning");
pub const kOfxMessageMessage: &CStr = cstr!("OfxMessageMessage");
pub const kOfxMessageLog: &CStr = cstr!("OfxMessageLog");
pub const kOfxMessageQuestion: &CStr = cstr!("OfxMessageQuestion");
